use crate::{
    errors::MortalityError, models::*, mortality::MortalityAnalyzer, parser::RegistryParser,
    Result,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::mpsc::Sender;

/// One endpoint's analysis, ready to run on any worker.
#[derive(Debug, Clone)]
pub struct EndpointTask {
    pub index: usize,
    pub endpoint: String,
    pub exposed: Vec<Exposure>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Started { endpoint: String },
    Finished { endpoint: String, n_params: usize },
    Failed { endpoint: String, reason: String },
}

/// Endpoint analyses share no mutable state, so they run on a plain rayon pool.
pub struct EndpointRunner;

impl EndpointRunner {
    /// Mortality analysis for every endpoint in `endpoints`, or for every
    /// endpoint found in the first events when `endpoints` is empty.
    pub fn analyze_endpoints(
        first_events: &[FirstEvent],
        minimal_phenotype: &[PhenotypeRecord],
        endpoints: &[String],
        config: &AnalysisConfig,
        progress: Option<Sender<Progress>>,
    ) -> Result<MortalityResults> {
        config.validate()?;

        let cohort = RegistryParser::get_cohort(minimal_phenotype, config);
        let cases = RegistryParser::get_cases(&config.outcome_endpoint, first_events, &cohort);
        log::info!("{} cohort members, {} cases", cohort.len(), cases.len());

        let endpoints = if endpoints.is_empty() {
            RegistryParser::list_endpoints(first_events, &config.outcome_endpoint)
        } else {
            endpoints.to_vec()
        };

        let tasks = Self::build_tasks(&endpoints, first_events, &cohort);
        Self::run(tasks, &cases, &cohort, config, progress)
    }

    pub fn build_tasks(
        endpoints: &[String],
        first_events: &[FirstEvent],
        cohort: &[CohortMember],
    ) -> Vec<EndpointTask> {
        endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| EndpointTask {
                index,
                endpoint: endpoint.clone(),
                exposed: RegistryParser::get_exposed(endpoint, first_events, cohort),
            })
            .collect()
    }

    /// Run the tasks on a dedicated pool. A failing endpoint is recorded and
    /// the remaining endpoints still run.
    pub fn run(
        tasks: Vec<EndpointTask>,
        cases: &[FirstEvent],
        cohort: &[CohortMember],
        config: &AnalysisConfig,
        progress: Option<Sender<Progress>>,
    ) -> Result<MortalityResults> {
        log::info!("Starting mortality analysis for {} endpoints", tasks.len());

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n_workers) = config.n_workers {
            builder = builder.num_threads(n_workers);
        }
        let pool = builder
            .build()
            .map_err(|e| MortalityError::CalculationError(format!("worker pool: {}", e)))?;

        let outcomes: Vec<std::result::Result<EndpointResults, FailedEndpoint>> = pool.install(|| {
            tasks
                .par_iter()
                .map_with(progress, |progress, task| {
                    Self::run_task(task, cases, cohort, config, progress.as_ref())
                })
                .collect()
        });

        let mut results = MortalityResults::default();
        for outcome in outcomes {
            match outcome {
                Ok(endpoint_results) => {
                    results.analysed_endpoints += 1;
                    results.results.extend(endpoint_results);
                }
                Err(failed) => results.failed_endpoints.push(failed),
            }
        }

        log::info!("Successfully analysed {} endpoints", results.analysed_endpoints);
        if !results.failed_endpoints.is_empty() {
            log::warn!("Failed to analyse {} endpoints", results.failed_endpoints.len());
        }

        Ok(results)
    }

    fn run_task(
        task: &EndpointTask,
        cases: &[FirstEvent],
        cohort: &[CohortMember],
        config: &AnalysisConfig,
        progress: Option<&Sender<Progress>>,
    ) -> std::result::Result<EndpointResults, FailedEndpoint> {
        let notify = |message: Progress| {
            if let Some(tx) = progress {
                // receiver may already be gone
                let _ = tx.send(message);
            }
        };
        notify(Progress::Started { endpoint: task.endpoint.clone() });

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed ^ task.index as u64),
            None => StdRng::from_entropy(),
        };

        match MortalityAnalyzer::mortality_analysis(
            &task.endpoint,
            cases,
            &task.exposed,
            cohort,
            config,
            &mut rng,
        ) {
            Ok(results) => {
                notify(Progress::Finished {
                    endpoint: task.endpoint.clone(),
                    n_params: results.params.len(),
                });
                Ok(results)
            }
            Err(e) => {
                log::error!("Failed to analyse endpoint {}: {}", task.endpoint, e);
                notify(Progress::Failed {
                    endpoint: task.endpoint.clone(),
                    reason: e.to_string(),
                });
                Err(FailedEndpoint {
                    endpoint: task.endpoint.clone(),
                    failure_reason: e.to_string(),
                })
            }
        }
    }
}
