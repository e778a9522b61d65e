use crate::{models::*, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub const PARAMS_FILE: &str = "mortality_params.csv";
pub const BASELINE_HAZARD_FILE: &str = "mortality_baseline_cumulative_hazard.csv";
pub const COUNTS_FILE: &str = "mortality_counts.csv";
pub const KEY_FIGURES_ALL_FILE: &str = "key_figures_all.csv";
pub const KEY_FIGURES_INDEX_PERSONS_FILE: &str = "key_figures_index_persons.csv";
pub const SUMMARY_FILE: &str = "run_summary.json";

const PARAMS_HEADER: [&str; 8] = [
    "endpoint", "sex", "covariate", "coef", "ci95_lower", "ci95_upper", "p_value", "mean",
];
const BASELINE_HAZARD_HEADER: [&str; 4] = ["endpoint", "sex", "age", "baseline_cumulative_hazard"];
const COUNTS_HEADER: [&str; 4] = ["endpoint", "sex", "exposed", "exposed_cases"];
const KEY_FIGURES_HEADER: [&str; 10] = [
    "endpoint",
    "nindivs_female",
    "nindivs_male",
    "nindivs_all",
    "mean_age_female",
    "mean_age_male",
    "mean_age_all",
    "prevalence_female",
    "prevalence_male",
    "prevalence_all",
];

#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    generated_at: DateTime<Utc>,
    config: &'a AnalysisConfig,
    analysed_endpoints: usize,
    n_failed_endpoints: usize,
    n_params: usize,
    n_baseline_hazard: usize,
    n_counts: usize,
    n_key_figures: usize,
    failed_endpoints: &'a [FailedEndpoint],
}

pub struct OutputManager;

impl OutputManager {
    pub fn save_results<P: AsRef<Path>>(
        results: &MortalityResults,
        key_figures_all: &[KeyFiguresRow],
        key_figures_index_persons: Option<&[KeyFiguresRow]>,
        config: &AnalysisConfig,
        output_path: P,
    ) -> Result<()> {
        let output_dir = output_path.as_ref();
        fs::create_dir_all(output_dir)?;

        Self::write_csv(&results.results.params, &PARAMS_HEADER, &output_dir.join(PARAMS_FILE))?;
        Self::write_csv(
            &results.results.baseline_hazard,
            &BASELINE_HAZARD_HEADER,
            &output_dir.join(BASELINE_HAZARD_FILE),
        )?;
        Self::write_csv(&results.results.counts, &COUNTS_HEADER, &output_dir.join(COUNTS_FILE))?;

        Self::write_csv(key_figures_all, &KEY_FIGURES_HEADER, &output_dir.join(KEY_FIGURES_ALL_FILE))?;
        if let Some(rows) = key_figures_index_persons {
            Self::write_csv(
                rows,
                &KEY_FIGURES_HEADER,
                &output_dir.join(KEY_FIGURES_INDEX_PERSONS_FILE),
            )?;
        }

        Self::save_failed_endpoints_log(&results.failed_endpoints, output_dir)?;
        Self::save_run_summary(results, key_figures_all.len(), config, output_dir)?;

        log::info!("Results saved to: {}", output_dir.display());
        Ok(())
    }

    /// Header is written even when there are no rows.
    fn write_csv<T: Serialize>(rows: &[T], header: &[&str], file_path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(file_path)?;
        writer.write_record(header)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn save_failed_endpoints_log(failed: &[FailedEndpoint], output_dir: &Path) -> Result<()> {
        if failed.is_empty() {
            return Ok(());
        }

        let file_path = output_dir.join("failed_endpoints.log");
        let mut file = File::create(file_path)?;

        writeln!(file, "FAILED ENDPOINT ANALYSIS LOG")?;
        writeln!(file, "============================")?;
        writeln!(file)?;
        writeln!(file, "Total failed endpoints: {}", failed.len())?;
        writeln!(file)?;

        for endpoint in failed {
            writeln!(file, "Endpoint: {}", endpoint.endpoint)?;
            writeln!(file, "Failure Reason: {}", endpoint.failure_reason)?;
            writeln!(file, "---")?;
        }

        Ok(())
    }

    fn save_run_summary(
        results: &MortalityResults,
        n_key_figures: usize,
        config: &AnalysisConfig,
        output_dir: &Path,
    ) -> Result<()> {
        let summary = RunSummary {
            generated_at: Utc::now(),
            config,
            analysed_endpoints: results.analysed_endpoints,
            n_failed_endpoints: results.failed_endpoints.len(),
            n_params: results.results.params.len(),
            n_baseline_hazard: results.results.baseline_hazard.len(),
            n_counts: results.results.counts.len(),
            n_key_figures,
            failed_endpoints: &results.failed_endpoints,
        };

        let json_string = serde_json::to_string_pretty(&summary)?;
        fs::write(output_dir.join(SUMMARY_FILE), json_string)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn results() -> MortalityResults {
        MortalityResults {
            results: EndpointResults {
                params: vec![ParameterRow {
                    endpoint: "T2D".to_string(),
                    sex: Sex::Female,
                    covariate: "exposure".to_string(),
                    coef: 0.4055,
                    ci95_lower: 0.1,
                    ci95_upper: 0.7,
                    p_value: 0.009,
                    mean: 0.3333,
                }],
                baseline_hazard: vec![
                    BaselineHazardRow {
                        endpoint: "T2D".to_string(),
                        sex: Sex::Female,
                        age: 70.0,
                        baseline_cumulative_hazard: Some(0.12),
                    },
                    BaselineHazardRow {
                        endpoint: "T2D".to_string(),
                        sex: Sex::Female,
                        age: 71.0,
                        baseline_cumulative_hazard: None,
                    },
                ],
                counts: Vec::new(),
            },
            analysed_endpoints: 1,
            failed_endpoints: vec![FailedEndpoint {
                endpoint: "ASTHMA".to_string(),
                failure_reason: "covariate birth_year has no variation".to_string(),
            }],
        }
    }

    #[test]
    fn test_save_results_writes_every_table() {
        let dir = tempdir().unwrap();
        OutputManager::save_results(&results(), &[], None, &AnalysisConfig::default(), dir.path())
            .unwrap();

        for file in [PARAMS_FILE, BASELINE_HAZARD_FILE, COUNTS_FILE, KEY_FIGURES_ALL_FILE, SUMMARY_FILE] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }
        assert!(!dir.path().join(KEY_FIGURES_INDEX_PERSONS_FILE).exists());
        assert!(dir.path().join("failed_endpoints.log").exists());

        let params = fs::read_to_string(dir.path().join(PARAMS_FILE)).unwrap();
        let mut lines = params.lines();
        assert_eq!(
            lines.next(),
            Some("endpoint,sex,covariate,coef,ci95_lower,ci95_upper,p_value,mean")
        );
        assert_eq!(lines.next(), Some("T2D,female,exposure,0.4055,0.1,0.7,0.009,0.3333"));
    }

    #[test]
    fn test_missing_values_are_empty_fields() {
        let dir = tempdir().unwrap();
        OutputManager::save_results(&results(), &[], None, &AnalysisConfig::default(), dir.path())
            .unwrap();

        let hazard = fs::read_to_string(dir.path().join(BASELINE_HAZARD_FILE)).unwrap();
        assert!(hazard.lines().any(|line| line == "T2D,female,71.0,"));

        let counts = fs::read_to_string(dir.path().join(COUNTS_FILE)).unwrap();
        assert_eq!(counts.trim(), "endpoint,sex,exposed,exposed_cases");
    }

    #[test]
    fn test_run_summary_lists_failures() {
        let dir = tempdir().unwrap();
        let key_figures = vec![KeyFiguresRow {
            endpoint: "T2D".to_string(),
            nindivs_female: Some(20),
            nindivs_male: None,
            nindivs_all: Some(23),
            mean_age_female: Some(50.0),
            mean_age_male: None,
            mean_age_all: Some(51.3),
            prevalence_female: Some(0.2),
            prevalence_male: None,
            prevalence_all: Some(0.15),
        }];
        OutputManager::save_results(
            &results(),
            &key_figures,
            Some(key_figures.as_slice()),
            &AnalysisConfig::default(),
            dir.path(),
        )
        .unwrap();

        assert!(dir.path().join(KEY_FIGURES_INDEX_PERSONS_FILE).exists());

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary["analysed_endpoints"], 1);
        assert_eq!(summary["n_failed_endpoints"], 1);
        assert_eq!(summary["n_key_figures"], 1);
        assert_eq!(summary["failed_endpoints"][0]["endpoint"], "ASTHMA");
        assert_eq!(summary["config"]["outcome_endpoint"], "DEATH");
        assert!(summary["generated_at"].is_string());
    }
}
