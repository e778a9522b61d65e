use crate::{
    cox::{CoxData, CoxFitter, CoxModel},
    models::*,
    Result,
};
use nalgebra::DMatrix;
use std::collections::{HashMap, HashSet};

pub const COVARIATES: [&str; 2] = ["exposure", "birth_year"];

pub struct SurvivalAnalyzer;

impl SurvivalAnalyzer {
    /// Fit the weighted Cox model on `timeline` with `timescale` as the time
    /// axis.
    ///
    /// Returns `Ok(None)` when some outcome × exposure cell does not hold
    /// more than `min_subjects_contingency` distinct subjects.
    pub fn survival_analysis(
        timeline: &[TimelineRow],
        timescale: Timescale,
        config: &AnalysisConfig,
    ) -> Result<Option<CoxModel>> {
        if !Self::min_subjects_check(timeline, config.min_subjects_contingency) {
            log::info!("Not enough subjects");
            return Ok(None);
        }

        log::info!("Fitting Cox PH model");
        let data = Self::cox_data(timeline, timescale)?;
        CoxFitter::new().fit(&data).map(Some)
    }

    /// Distinct subjects per (outcome, exposure) cell, counting a subject
    /// once whichever roles it appears in.
    pub fn contingency_counts(timeline: &[TimelineRow]) -> HashMap<(u8, u8), usize> {
        let mut cells: HashMap<(u8, u8), HashSet<&str>> = HashMap::new();
        for row in timeline {
            cells
                .entry((row.outcome, row.exposure))
                .or_default()
                .insert(row.id.subject_id.as_str());
        }
        cells.into_iter().map(|(cell, subjects)| (cell, subjects.len())).collect()
    }

    fn min_subjects_check(timeline: &[TimelineRow], min_subjects: usize) -> bool {
        let counts = Self::contingency_counts(timeline);
        [(0, 0), (0, 1), (1, 0), (1, 1)]
            .iter()
            .all(|cell| counts.get(cell).copied().unwrap_or(0) > min_subjects)
    }

    fn cox_data(timeline: &[TimelineRow], timescale: Timescale) -> Result<CoxData> {
        let n = timeline.len();

        // every row is its own cluster in the sandwich variance
        let clusters: Vec<usize> = (0..n).collect();

        let covariates = DMatrix::from_fn(n, COVARIATES.len(), |i, j| match j {
            0 => f64::from(timeline[i].exposure),
            _ => timeline[i].birth_year,
        });

        CoxData::new(
            timeline.iter().map(|row| row.start(timescale)).collect(),
            timeline.iter().map(|row| row.stop(timescale)).collect(),
            timeline.iter().map(|row| row.outcome == 1).collect(),
            timeline.iter().map(|row| row.weight).collect(),
            covariates,
            clusters,
            COVARIATES.iter().map(|name| name.to_string()).collect(),
        )
    }
}
