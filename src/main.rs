use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use mortality_analysis::{
    example_data::ExampleDataGenerator,
    key_figures::KeyFiguresCalculator,
    models::*,
    output::OutputManager,
    parser::RegistryParser,
    runner::{EndpointRunner, Progress},
};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("Mortality Analysis Tool")
        .version("1.0")
        .about("Case-cohort Cox regression of mortality on registry endpoints")
        .arg(
            Arg::new("minimal-phenotype")
                .long("minimal-phenotype")
                .value_name("FILE")
                .help("Minimal phenotype CSV (personid,birth_year,death_year,female,index_person)")
                .required_unless_present("generate-example"),
        )
        .arg(
            Arg::new("first-events")
                .long("first-events")
                .value_name("FILE")
                .help("First events CSV (personid,endpoint,age)")
                .required_unless_present("generate-example"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .help("Output directory for results")
                .default_value("./mortality_results"),
        )
        .arg(
            Arg::new("endpoint")
                .short('e')
                .long("endpoint")
                .value_name("NAME")
                .help("Exposure endpoint to analyse (repeatable, default: all)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("workers")
                .short('j')
                .long("workers")
                .value_name("N")
                .help("Number of worker threads")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("N")
                .help("Seed for case and control sampling")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("n-cases")
                .long("n-cases")
                .value_name("N")
                .help("Maximum number of sampled cases per stratum")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("controls-per-case")
                .long("controls-per-case")
                .value_name("N")
                .help("Number of cohort controls sampled per case")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("index-persons")
                .long("index-persons")
                .help("Also compute key figures for index persons only")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-example")
                .long("generate-example")
                .help("Generate an example registry in the output directory and analyse it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("subjects")
                .short('n')
                .long("subjects")
                .value_name("NUMBER")
                .help("Number of subjects for the example registry")
                .value_parser(value_parser!(usize))
                .default_value("20000"),
        )
        .get_matches();

    let output_dir = PathBuf::from(
        matches
            .get_one::<String>("output")
            .context("missing output directory")?,
    );

    let (phenotype_path, first_events_path) = if matches.get_flag("generate-example") {
        let n_subjects = *matches.get_one::<usize>("subjects").unwrap_or(&20_000);
        let seed = matches.get_one::<u64>("seed").copied().unwrap_or(42);
        let paths = ExampleDataGenerator::generate_dataset(output_dir.join("example_registry"), n_subjects, seed)
            .context("failed to generate example registry")?;
        println!("Generated example registry: {}", paths.0.parent().unwrap_or(output_dir.as_path()).display());
        paths
    } else {
        (
            PathBuf::from(matches.get_one::<String>("minimal-phenotype").context("missing --minimal-phenotype")?),
            PathBuf::from(matches.get_one::<String>("first-events").context("missing --first-events")?),
        )
    };

    run_analysis(&phenotype_path, &first_events_path, &output_dir, &matches)
}

fn run_analysis(
    phenotype_path: &Path,
    first_events_path: &Path,
    output_dir: &Path,
    matches: &ArgMatches,
) -> Result<()> {
    println!("Starting mortality analysis...");
    println!("Minimal phenotype: {}", phenotype_path.display());
    println!("First events: {}", first_events_path.display());
    println!("Output directory: {}", output_dir.display());

    let config = create_analysis_config(matches);
    config.validate().context("invalid analysis configuration")?;

    println!("Parsing registry...");
    let phenotype = RegistryParser::parse_minimal_phenotype(phenotype_path)
        .with_context(|| format!("failed to read {}", phenotype_path.display()))?;
    let first_events = RegistryParser::parse_first_events(first_events_path, &phenotype)
        .with_context(|| format!("failed to read {}", first_events_path.display()))?;
    println!("Loaded {} subjects and {} first events", phenotype.len(), first_events.len());

    let endpoints: Vec<String> = matches
        .get_many::<String>("endpoint")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    let (tx, rx) = mpsc::channel();
    let progress_logger = thread::spawn(move || {
        for message in rx {
            match message {
                Progress::Started { endpoint } => log::info!("{}: started", endpoint),
                Progress::Finished { endpoint, n_params } => {
                    log::info!("{}: finished ({} parameter rows)", endpoint, n_params)
                }
                Progress::Failed { endpoint, reason } => log::error!("{}: failed: {}", endpoint, reason),
            }
        }
    });

    println!("Performing mortality analysis...");
    let start_time = std::time::Instant::now();

    let results = EndpointRunner::analyze_endpoints(&first_events, &phenotype, &endpoints, &config, Some(tx))
        .context("mortality analysis failed")?;
    if progress_logger.join().is_err() {
        log::warn!("progress logger panicked");
    }

    let key_figures_all =
        KeyFiguresCalculator::compute_key_figures(&first_events, &phenotype, false, &config);
    let key_figures_index_persons = config
        .index_persons
        .then(|| KeyFiguresCalculator::compute_key_figures(&first_events, &phenotype, true, &config));

    let duration = start_time.elapsed();
    println!("Analysis completed in {:.2} seconds", duration.as_secs_f64());

    println!("Saving results...");
    OutputManager::save_results(
        &results,
        &key_figures_all,
        key_figures_index_persons.as_deref(),
        &config,
        output_dir,
    )
    .with_context(|| format!("failed to write results to {}", output_dir.display()))?;

    print_analysis_summary(&results, key_figures_all.len());

    Ok(())
}

fn create_analysis_config(matches: &ArgMatches) -> AnalysisConfig {
    let defaults = AnalysisConfig::default();
    AnalysisConfig {
        n_cases: matches.get_one::<usize>("n-cases").copied().unwrap_or(defaults.n_cases),
        controls_per_case: matches
            .get_one::<usize>("controls-per-case")
            .copied()
            .unwrap_or(defaults.controls_per_case),
        index_persons: matches.get_flag("index-persons"),
        n_workers: matches.get_one::<usize>("workers").copied(),
        seed: matches.get_one::<u64>("seed").copied(),
        ..defaults
    }
}

fn print_analysis_summary(results: &MortalityResults, n_key_figures: usize) {
    println!("\n=== ANALYSIS SUMMARY ===");
    println!("Endpoints analysed: {}", results.analysed_endpoints);
    if !results.failed_endpoints.is_empty() {
        println!("Failed endpoints: {}", results.failed_endpoints.len());
        println!("  (See failed_endpoints.log for details)");
    }

    println!("\nExposure hazard ratios:");
    for row in results.results.params.iter().filter(|p| p.covariate == "exposure") {
        println!(
            "  {} ({}): HR = {:.3} [{:.3}, {:.3}], p = {:.4}",
            row.endpoint,
            row.sex,
            row.coef.exp(),
            row.ci95_lower.exp(),
            row.ci95_upper.exp(),
            row.p_value
        );
    }

    println!("\nKey figure rows: {}", n_key_figures);
    println!("\nResults saved to output directory.");
}
