use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PHENOTYPE_FILE: &str = "minimal_phenotype.csv";
pub const FIRST_EVENTS_FILE: &str = "first_events.csv";

/// Endpoint name, lifetime probability, age range of onset, log hazard
/// ratio for death once present.
const ENDPOINTS: [(&str, f64, (f64, f64), f64); 4] = [
    ("T2D", 0.30, (35.0, 80.0), 0.6),
    ("I9_HYPTENS", 0.40, (30.0, 75.0), 0.3),
    ("J10_ASTHMA", 0.15, (5.0, 60.0), 0.1),
    ("F5_DEPRESSIO", 0.20, (18.0, 70.0), 0.4),
];

const SIMULATION_START: i32 = 1980;
const SIMULATION_END: i32 = 2019;

struct SyntheticSubject {
    personid: String,
    birth_year: f64,
    death_year: Option<f64>,
    female: Option<bool>,
    index_person: bool,
    first_events: Vec<(&'static str, f64)>,
}

pub struct ExampleDataGenerator;

impl ExampleDataGenerator {
    /// Write a synthetic minimal phenotype and first-events table into
    /// `output_dir`. Returns the two file paths.
    pub fn generate_dataset<P: AsRef<Path>>(
        output_dir: P,
        n_subjects: usize,
        seed: u64,
    ) -> Result<(PathBuf, PathBuf)> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        let mut rng = StdRng::seed_from_u64(seed);
        let subjects: Vec<SyntheticSubject> = (1..=n_subjects)
            .map(|i| Self::generate_subject(&mut rng, i))
            .collect();

        let phenotype_path = output_dir.join(PHENOTYPE_FILE);
        let mut file = File::create(&phenotype_path)?;
        writeln!(file, "personid,birth_year,death_year,female,index_person")?;
        for subject in &subjects {
            writeln!(
                file,
                "{},{:.2},{},{},{}",
                subject.personid,
                subject.birth_year,
                subject.death_year.map_or(String::new(), |d| format!("{:.2}", d)),
                subject.female.map_or("", |f| if f { "1" } else { "0" }),
                if subject.index_person { 1 } else { 0 },
            )?;
        }

        let first_events_path = output_dir.join(FIRST_EVENTS_FILE);
        let mut file = File::create(&first_events_path)?;
        writeln!(file, "personid,endpoint,age")?;
        let mut n_events = 0;
        for subject in &subjects {
            for (endpoint, age) in &subject.first_events {
                writeln!(file, "{},{},{:.2}", subject.personid, endpoint, age)?;
                n_events += 1;
            }
        }

        log::info!(
            "Generated example registry with {} subjects and {} first events",
            n_subjects,
            n_events
        );
        Ok((phenotype_path, first_events_path))
    }

    fn generate_subject(rng: &mut StdRng, index: usize) -> SyntheticSubject {
        let birth_year = Self::round2(rng.gen_range(1920.0..1985.0));
        let female = match rng.gen_range(0..100) {
            0..=48 => Some(true),
            49..=97 => Some(false),
            _ => None,
        };
        let index_person = rng.gen_bool(0.6);

        let mut onsets: Vec<(&'static str, f64, f64)> = Vec::new();
        for (endpoint, probability, (lo, hi), log_hr) in ENDPOINTS {
            if rng.gen_bool(probability) {
                onsets.push((endpoint, Self::round2(rng.gen_range(lo..hi)), log_hr));
            }
        }

        let death_year = Self::simulate_death(rng, birth_year, &onsets);

        // nothing is recorded after death or after the registry ends
        let last_year = death_year.unwrap_or(SIMULATION_END as f64);
        onsets.retain(|(_, age, _)| birth_year + age < last_year);

        let mut first_events: Vec<(&'static str, f64)> =
            onsets.iter().map(|(endpoint, age, _)| (*endpoint, *age)).collect();
        if let Some(death) = death_year {
            first_events.push(("DEATH", Self::round2(death - birth_year)));
        }

        SyntheticSubject {
            personid: format!("FR{:07}", index),
            birth_year,
            death_year,
            female,
            index_person,
            first_events,
        }
    }

    /// Yearly Gompertz-like death hazard, raised by every endpoint already
    /// present.
    fn simulate_death(rng: &mut StdRng, birth_year: f64, onsets: &[(&str, f64, f64)]) -> Option<f64> {
        let first_year = SIMULATION_START.max(birth_year.ceil() as i32);
        for year in first_year..=SIMULATION_END {
            let age = year as f64 - birth_year;
            let log_hr: f64 = onsets
                .iter()
                .filter(|(_, onset, _)| *onset <= age)
                .map(|(_, _, log_hr)| log_hr)
                .sum();
            let hazard = (0.0005 * (0.085 * (age - 40.0)).exp() * log_hr.exp()).min(0.9);

            if rng.gen_bool(hazard) {
                let death = year as f64 + rng.gen_range(0.0..1.0);
                return Some(Self::round2(death.min(SIMULATION_END as f64)));
            }
        }
        None
    }

    fn round2(value: f64) -> f64 {
        (value * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RegistryParser;
    use tempfile::tempdir;

    #[test]
    fn test_generated_registry_parses() {
        let dir = tempdir().unwrap();
        let (phenotype_path, events_path) =
            ExampleDataGenerator::generate_dataset(dir.path(), 300, 42).unwrap();

        let phenotype = RegistryParser::parse_minimal_phenotype(&phenotype_path).unwrap();
        let events = RegistryParser::parse_first_events(&events_path, &phenotype).unwrap();

        assert_eq!(phenotype.len(), 300);
        assert!(events.iter().any(|e| e.endpoint == "DEATH"));
        assert!(events.iter().any(|e| e.endpoint == "T2D"));
        for event in events.iter().filter(|e| e.endpoint == "DEATH") {
            let death = event.death_year.unwrap();
            assert!((event.birth_year + event.age - death).abs() < 0.02);
        }
    }

    #[test]
    fn test_same_seed_same_registry() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        ExampleDataGenerator::generate_dataset(a.path(), 100, 7).unwrap();
        ExampleDataGenerator::generate_dataset(b.path(), 100, 7).unwrap();

        for file in [PHENOTYPE_FILE, FIRST_EVENTS_FILE] {
            assert_eq!(
                fs::read_to_string(a.path().join(file)).unwrap(),
                fs::read_to_string(b.path().join(file)).unwrap()
            );
        }
    }
}
