use mortality_analysis::{
    example_data::ExampleDataGenerator,
    key_figures::KeyFiguresCalculator,
    models::*,
    output::{self, OutputManager},
    parser::RegistryParser,
    runner::EndpointRunner,
    timeline::TimelineBuilder,
};
use std::fs;
use tempfile::TempDir;

fn test_config() -> AnalysisConfig {
    AnalysisConfig {
        min_subjects_personal_data: 3,
        min_subjects_survival_analysis: 20,
        min_subjects_contingency: 10,
        n_workers: Some(2),
        seed: Some(2024),
        index_persons: true,
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_complete_mortality_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    // Generate example registry
    let (phenotype_path, events_path) =
        ExampleDataGenerator::generate_dataset(temp_path.join("registry"), 4000, 11).unwrap();

    // Parse registry
    let phenotype = RegistryParser::parse_minimal_phenotype(&phenotype_path).unwrap();
    let first_events = RegistryParser::parse_first_events(&events_path, &phenotype).unwrap();
    assert_eq!(phenotype.len(), 4000);

    let config = test_config();
    let endpoints = RegistryParser::list_endpoints(&first_events, &config.outcome_endpoint);
    assert!(endpoints.contains(&"T2D".to_string()));
    assert!(!endpoints.contains(&"DEATH".to_string()));

    // Perform analysis
    let results =
        EndpointRunner::analyze_endpoints(&first_events, &phenotype, &[], &config, None).unwrap();
    assert_eq!(results.analysed_endpoints + results.failed_endpoints.len(), endpoints.len());
    assert!(!results.results.params.is_empty());

    for row in &results.results.params {
        assert!(row.covariate == "exposure" || row.covariate == "birth_year");
        assert!(row.ci95_lower <= row.ci95_upper);
    }
    for row in &results.results.counts {
        assert!(row.exposed_cases >= config.min_subjects_survival_analysis);
        assert!(row.exposed >= row.exposed_cases);
    }

    let key_figures_all =
        KeyFiguresCalculator::compute_key_figures(&first_events, &phenotype, false, &config);
    let key_figures_index =
        KeyFiguresCalculator::compute_key_figures(&first_events, &phenotype, true, &config);
    assert!(key_figures_all.iter().any(|row| row.endpoint == "DEATH"));

    // Save results
    let output_path = temp_path.join("results");
    OutputManager::save_results(
        &results,
        &key_figures_all,
        Some(key_figures_index.as_slice()),
        &config,
        &output_path,
    )
    .unwrap();

    for file in [
        output::PARAMS_FILE,
        output::BASELINE_HAZARD_FILE,
        output::COUNTS_FILE,
        output::KEY_FIGURES_ALL_FILE,
        output::KEY_FIGURES_INDEX_PERSONS_FILE,
        output::SUMMARY_FILE,
    ] {
        assert!(output_path.join(file).exists(), "{} missing", file);
    }

    let params = fs::read_to_string(output_path.join(output::PARAMS_FILE)).unwrap();
    assert_eq!(params.lines().count(), results.results.params.len() + 1);
}

#[test]
fn test_seeded_workflow_is_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let (phenotype_path, events_path) =
        ExampleDataGenerator::generate_dataset(temp_dir.path(), 2000, 3).unwrap();
    let phenotype = RegistryParser::parse_minimal_phenotype(&phenotype_path).unwrap();
    let first_events = RegistryParser::parse_first_events(&events_path, &phenotype).unwrap();

    let config = AnalysisConfig { n_cases: 150, controls_per_case: 1, ..test_config() };
    let endpoints = vec!["T2D".to_string(), "I9_HYPTENS".to_string()];

    let first =
        EndpointRunner::analyze_endpoints(&first_events, &phenotype, &endpoints, &config, None).unwrap();
    let single_worker = AnalysisConfig { n_workers: Some(1), ..config };
    let second =
        EndpointRunner::analyze_endpoints(&first_events, &phenotype, &endpoints, &single_worker, None)
            .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_key_figures_redaction_law() {
    let temp_dir = TempDir::new().unwrap();
    let (phenotype_path, events_path) =
        ExampleDataGenerator::generate_dataset(temp_dir.path(), 500, 5).unwrap();
    let phenotype = RegistryParser::parse_minimal_phenotype(&phenotype_path).unwrap();
    let first_events = RegistryParser::parse_first_events(&events_path, &phenotype).unwrap();

    let config = AnalysisConfig { min_subjects_personal_data: 40, ..AnalysisConfig::default() };
    let rows = KeyFiguresCalculator::compute_key_figures(&first_events, &phenotype, false, &config);

    for row in &rows {
        let female = first_events
            .iter()
            .filter(|e| e.endpoint == row.endpoint && e.female == Some(true))
            .count();
        if female < 40 {
            assert_eq!(row.nindivs_female, None);
            assert_eq!(row.mean_age_female, None);
            assert_eq!(row.prevalence_female, None);
        } else {
            assert_eq!(row.nindivs_female, Some(female));
        }

        let all = first_events.iter().filter(|e| e.endpoint == row.endpoint).count();
        if all < 40 {
            assert_eq!(row.nindivs_all, None);
        } else {
            assert_eq!(row.nindivs_all, Some(all));
        }
    }
}

#[test]
fn test_timeline_for_documented_subject() {
    let config = AnalysisConfig::default();
    let fs_ = config.followup_start;
    let subject = StudySubject {
        id: TimelineId::case("FR1"),
        birth_year: fs_ - 10.0,
        death_year: None,
        exposure_year: Some(fs_ + 5.0),
        outcome_year: Some(fs_ + 10.0),
        weight: 1.0,
        female: Some(true),
    };

    let timeline = TimelineBuilder::build_cph_dataset(&[subject.clone()], &config);
    let rows: Vec<[f64; 4]> = timeline
        .rows
        .iter()
        .map(|r| [r.start_time, r.stop_time, r.outcome as f64, r.exposure as f64])
        .collect();
    assert_eq!(rows, vec![[0.0, 5.0, 0.0, 0.0], [5.0, 10.0, 1.0, 1.0]]);

    let early_outcome = StudySubject { outcome_year: Some(fs_ - 5.0), ..subject };
    let timeline = TimelineBuilder::build_cph_dataset(&[early_outcome], &config);
    let rows: Vec<[f64; 4]> = timeline
        .rows
        .iter()
        .map(|r| [r.start_time, r.stop_time, r.outcome as f64, r.exposure as f64])
        .collect();
    assert_eq!(rows, vec![[0.0, config.followup_end - fs_, 0.0, 0.0]]);
}
