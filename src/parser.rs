use crate::{errors::MortalityError, models::*, Result};
use csv::ReaderBuilder;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::path::Path;

pub struct RegistryParser;

impl RegistryParser {
    /// Load the minimal phenotype table
    /// (`personid,birth_year,death_year,female,index_person`).
    pub fn parse_minimal_phenotype<P: AsRef<Path>>(file_path: P) -> Result<Vec<PhenotypeRecord>> {
        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = reader.headers()?.clone();

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row = Self::parse_record(&headers, &record);

            records.push(PhenotypeRecord {
                personid: Self::parse_string(&row, "personid")?,
                birth_year: Self::parse_float(&row, "birth_year")?,
                death_year: Self::parse_float_optional(&row, "death_year")?,
                female: Self::parse_bool(&row, "female")?,
                index_person: Self::parse_bool(&row, "index_person")?,
            });
        }

        log::info!("{} subjects in minimal phenotype", records.len());
        Ok(records)
    }

    /// Load the first-events table (`personid,endpoint,age`) and join each
    /// event with its subject's phenotype. Events of unknown subjects are
    /// dropped.
    pub fn parse_first_events<P: AsRef<Path>>(
        file_path: P,
        phenotype: &[PhenotypeRecord],
    ) -> Result<Vec<FirstEvent>> {
        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let headers = reader.headers()?.clone();

        let subjects: HashMap<&str, &PhenotypeRecord> =
            phenotype.iter().map(|p| (p.personid.as_str(), p)).collect();

        let mut events = Vec::new();
        let mut unmatched = 0;
        for result in reader.records() {
            let record = result?;
            let row = Self::parse_record(&headers, &record);

            let personid = Self::parse_string(&row, "personid")?;
            let endpoint = Self::parse_string(&row, "endpoint")?;
            let age = Self::parse_float(&row, "age")?;

            match subjects.get(personid.as_str()) {
                Some(subject) => events.push(FirstEvent {
                    personid,
                    endpoint,
                    age,
                    birth_year: subject.birth_year,
                    death_year: subject.death_year,
                    female: subject.female,
                    index_person: subject.index_person,
                }),
                None => unmatched += 1,
            }
        }

        if unmatched > 0 {
            log::info!("{} first events without a phenotype record were dropped", unmatched);
        }
        Ok(events)
    }

    /// Subjects of known sex, born by the end of follow-up and alive at its
    /// start.
    pub fn get_cohort(phenotype: &[PhenotypeRecord], config: &AnalysisConfig) -> Vec<CohortMember> {
        phenotype
            .iter()
            .filter(|p| p.female.is_some())
            .filter(|p| p.birth_year <= config.followup_end)
            .filter(|p| p.death_year.map_or(true, |death| death >= config.followup_start))
            .map(|p| CohortMember {
                personid: p.personid.clone(),
                birth_year: p.birth_year,
                death_year: p.death_year,
                female: p.female,
            })
            .collect()
    }

    pub fn get_cases(
        outcome_endpoint: &str,
        first_events: &[FirstEvent],
        cohort: &[CohortMember],
    ) -> Vec<FirstEvent> {
        let cohort_ids: HashSet<&str> = cohort.iter().map(|m| m.personid.as_str()).collect();
        first_events
            .iter()
            .filter(|e| e.endpoint == outcome_endpoint && cohort_ids.contains(e.personid.as_str()))
            .cloned()
            .collect()
    }

    /// Exposure year of every cohort member with a first event of `endpoint`.
    pub fn get_exposed(
        endpoint: &str,
        first_events: &[FirstEvent],
        cohort: &[CohortMember],
    ) -> Vec<Exposure> {
        let cohort_ids: HashSet<&str> = cohort.iter().map(|m| m.personid.as_str()).collect();
        first_events
            .iter()
            .filter(|e| e.endpoint == endpoint && cohort_ids.contains(e.personid.as_str()))
            .map(|e| Exposure {
                personid: e.personid.clone(),
                exposure_year: e.birth_year + e.age,
            })
            .collect()
    }

    pub fn list_endpoints(first_events: &[FirstEvent], outcome_endpoint: &str) -> Vec<String> {
        first_events
            .iter()
            .map(|e| e.endpoint.as_str())
            .filter(|endpoint| *endpoint != outcome_endpoint)
            .unique()
            .sorted()
            .map(str::to_string)
            .collect()
    }

    fn parse_record(headers: &csv::StringRecord, record: &csv::StringRecord) -> HashMap<String, String> {
        headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
            .collect()
    }

    fn parse_string(row: &HashMap<String, String>, key: &str) -> Result<String> {
        match row.get(key) {
            Some(value) if !value.is_empty() => Ok(value.clone()),
            Some(_) => Err(MortalityError::ParseError(format!("Empty value for {}", key))),
            None => Err(MortalityError::ParseError(format!("Missing column: {}", key))),
        }
    }

    fn parse_float(row: &HashMap<String, String>, key: &str) -> Result<f64> {
        Self::parse_float_optional(row, key)?
            .ok_or_else(|| MortalityError::ParseError(format!("Empty value for {}", key)))
    }

    fn parse_float_optional(row: &HashMap<String, String>, key: &str) -> Result<Option<f64>> {
        let value = row
            .get(key)
            .ok_or_else(|| MortalityError::ParseError(format!("Missing column: {}", key)))?;
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| MortalityError::ParseError(format!("Invalid float value for {}: {}", key, value)))
    }

    fn parse_bool(row: &HashMap<String, String>, key: &str) -> Result<Option<bool>> {
        let value = row
            .get(key)
            .ok_or_else(|| MortalityError::ParseError(format!("Missing column: {}", key)))?;
        match value.to_lowercase().as_str() {
            "" => Ok(None),
            "1" | "1.0" | "true" | "yes" => Ok(Some(true)),
            "0" | "0.0" | "false" | "no" => Ok(Some(false)),
            other => Err(MortalityError::ParseError(format!(
                "Invalid flag value for {}: {}",
                key, other
            ))),
        }
    }
}
