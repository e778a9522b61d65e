use crate::models::*;
use std::collections::HashMap;

/// Builds left-truncated, right-censored interval timelines with exposure
/// as a time-varying covariate.
pub struct TimelineBuilder;

impl TimelineBuilder {
    /// Outcome interval for each subject on the time-on-study scale.
    ///
    /// Outcomes outside the follow-up window are censored. A missing death or
    /// outcome year never bounds the stop time.
    pub fn build_outcome_dataset(
        subjects: &[StudySubject],
        config: &AnalysisConfig,
    ) -> Vec<OutcomeInterval> {
        let (followup_start, followup_end) = (config.followup_start, config.followup_end);

        subjects
            .iter()
            .map(|subject| {
                let outcome_year = subject
                    .outcome_year
                    .filter(|&year| year >= followup_start && year <= followup_end);

                let start_year = subject.birth_year.max(followup_start);
                let stop_year = [subject.death_year, outcome_year]
                    .into_iter()
                    .flatten()
                    .fold(followup_end, f64::min);

                OutcomeInterval {
                    id: subject.id.clone(),
                    start: start_year - followup_start,
                    stop: stop_year - followup_start,
                    outcome: u8::from(outcome_year.is_some()),
                    birth_year: subject.birth_year,
                    weight: subject.weight,
                    female: subject.female,
                }
            })
            .collect()
    }

    /// Exposures that are valid as a time-varying covariate: inside the
    /// follow-up window and not after the outcome.
    pub fn build_exposure_dataset(
        subjects: &[StudySubject],
        config: &AnalysisConfig,
    ) -> Vec<ExposureEvent> {
        subjects
            .iter()
            .filter_map(|subject| {
                let exposure_year = subject.exposure_year?;
                let inside_timeframe = exposure_year >= config.followup_start
                    && exposure_year <= config.followup_end;
                let before_outcome = subject.outcome_year.map_or(true, |o| exposure_year <= o);

                (inside_timeframe && before_outcome).then(|| ExposureEvent {
                    id: subject.id.clone(),
                    duration: exposure_year - config.followup_start,
                    exposure: 1,
                })
            })
            .collect()
    }

    /// Combine outcome intervals and exposures into the regression timeline.
    ///
    /// Each subject-role interval is split at its exposure time. Rows carry
    /// both time-on-study and age bounds so the timescale can be chosen when
    /// fitting.
    pub fn build_cph_dataset(subjects: &[StudySubject], config: &AnalysisConfig) -> Timeline {
        let exposures: HashMap<TimelineId, f64> = Self::build_exposure_dataset(subjects, config)
            .into_iter()
            .map(|event| (event.id, event.duration))
            .collect();
        let outcomes = Self::build_outcome_dataset(subjects, config);

        let mut rows = Vec::with_capacity(outcomes.len() * 2);
        for interval in &outcomes {
            match exposures.get(&interval.id).copied() {
                Some(duration) if duration <= interval.start => {
                    rows.push(Self::row(interval, interval.start, interval.stop, interval.outcome, 1, config));
                }
                Some(duration) if duration < interval.stop => {
                    rows.push(Self::row(interval, interval.start, duration, 0, 0, config));
                    rows.push(Self::row(interval, duration, interval.stop, interval.outcome, 1, config));
                }
                _ => {
                    rows.push(Self::row(interval, interval.start, interval.stop, interval.outcome, 0, config));
                }
            }
        }

        let n_rows = rows.len();
        rows.retain(|row| row.start_time < row.stop_time);
        let dropped_rows = n_rows - rows.len();
        log::info!("{} rows had start >= stop", dropped_rows);

        Timeline { rows, dropped_rows }
    }

    fn row(
        interval: &OutcomeInterval,
        start: f64,
        stop: f64,
        outcome: u8,
        exposure: u8,
        config: &AnalysisConfig,
    ) -> TimelineRow {
        let age_offset = config.followup_start - interval.birth_year;
        TimelineRow {
            id: interval.id.clone(),
            start_time: start,
            stop_time: stop,
            start_age: start + age_offset,
            stop_age: stop + age_offset,
            outcome,
            exposure,
            birth_year: interval.birth_year,
            weight: interval.weight,
            female: interval.female,
        }
    }
}
