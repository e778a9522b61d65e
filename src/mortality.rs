use crate::{
    cox::CoxModel,
    models::*,
    sample::Sampler,
    survival::SurvivalAnalyzer,
    timeline::TimelineBuilder,
    Result,
};
use itertools::Itertools;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Round half to even at `digits` decimals.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round_ties_even() / factor
}

pub struct MortalityAnalyzer;

impl MortalityAnalyzer {
    /// Mortality analysis for `endpoint`.
    ///
    /// Cox PH model on the age timescale with the endpoint as a time-varying
    /// covariate and birth year as a fixed covariate, estimated separately
    /// for each sex.
    pub fn mortality_analysis<R: Rng + ?Sized>(
        endpoint: &str,
        cases: &[FirstEvent],
        exposed: &[Exposure],
        cohort: &[CohortMember],
        config: &AnalysisConfig,
        rng: &mut R,
    ) -> Result<EndpointResults> {
        log::debug!("{}", endpoint);

        let mut results = EndpointResults::default();

        let exposed_ids: BTreeSet<&str> = exposed.iter().map(|e| e.personid.as_str()).collect();
        let exposed_cases: Vec<&FirstEvent> = cases
            .iter()
            .filter(|case| exposed_ids.contains(case.personid.as_str()))
            .collect();
        let sexes: BTreeSet<Sex> = exposed_cases
            .iter()
            .filter_map(|case| Sex::from_female(case.female))
            .collect();

        for sex in sexes {
            let n_exposed_cases = exposed_cases
                .iter()
                .filter(|case| Sex::from_female(case.female) == Some(sex))
                .count();

            if n_exposed_cases < config.min_subjects_survival_analysis {
                log::debug!(
                    "{} ({}): {} exposed cases, at least {} required",
                    endpoint,
                    sex,
                    n_exposed_cases,
                    config.min_subjects_survival_analysis
                );
                continue;
            }

            let cases_: Vec<FirstEvent> = cases
                .iter()
                .filter(|case| Sex::from_female(case.female) == Some(sex))
                .cloned()
                .collect();
            let cohort_: Vec<CohortMember> = cohort
                .iter()
                .filter(|member| Sex::from_female(member.female) == Some(sex))
                .cloned()
                .collect();

            let timeline = match Self::build_survival_dataset(&cases_, &cohort_, exposed, config, rng) {
                Some(timeline) => timeline,
                None => {
                    log::warn!("{} ({}): case-cohort weights undefined, skipping", endpoint, sex);
                    continue;
                }
            };

            let model = match SurvivalAnalyzer::survival_analysis(&timeline.rows, Timescale::Age, config)? {
                Some(model) => model,
                None => continue,
            };

            log::debug!("Removing personal data");
            results.baseline_hazard.extend(Self::baseline_hazard_rows(
                endpoint,
                sex,
                &model,
                &timeline.rows,
                config,
            ));
            results.params.extend(Self::parameter_rows(endpoint, sex, &model, config));
            results.counts.push(Self::counts_row(
                endpoint,
                sex,
                exposed,
                cohort,
                n_exposed_cases,
            ));
        }

        Ok(results)
    }

    /// Case-cohort timeline for one stratum: sampled cases in the case role
    /// followed to their outcome, sampled cohort members in the control role
    /// censored at death or end of follow-up.
    ///
    /// Returns `None` when the case-cohort weights are undefined.
    pub fn build_survival_dataset<R: Rng + ?Sized>(
        cases: &[FirstEvent],
        cohort: &[CohortMember],
        exposed: &[Exposure],
        config: &AnalysisConfig,
        rng: &mut R,
    ) -> Option<Timeline> {
        let (sampled_cases, caseids) = Sampler::sample_cases(
            cases,
            &config.outcome_endpoint,
            config.n_cases,
            config.followup_start,
            rng,
        );
        let n_controls = sampled_cases.len().saturating_mul(config.controls_per_case);
        let controls = Sampler::sample_controls(cohort, n_controls, rng);

        let controlids: Vec<String> = cohort.iter().map(|m| m.personid.clone()).collect();
        let sampled_caseids: Vec<String> = sampled_cases.iter().map(|c| c.personid.clone()).collect();
        let sampled_controlids: Vec<String> = controls.iter().map(|c| c.personid.clone()).collect();

        let weights = Sampler::calculate_case_cohort_weights(
            &caseids,
            &controlids,
            &sampled_caseids,
            &sampled_controlids,
        );
        if !weights.is_defined() {
            return None;
        }

        let exposure_years: HashMap<&str, f64> = exposed
            .iter()
            .map(|e| (e.personid.as_str(), e.exposure_year))
            .collect();

        let case_subjects = sampled_cases.iter().map(|case| StudySubject {
            id: TimelineId::case(case.personid.clone()),
            birth_year: case.birth_year,
            death_year: case.death_year,
            exposure_year: exposure_years.get(case.personid.as_str()).copied(),
            outcome_year: Some(case.stop),
            weight: weights.cases,
            female: case.female,
        });
        let control_subjects = controls.iter().map(|control| StudySubject {
            id: TimelineId::control(control.personid.clone()),
            birth_year: control.birth_year,
            death_year: control.death_year,
            exposure_year: exposure_years.get(control.personid.as_str()).copied(),
            outcome_year: None,
            weight: weights.controls,
            female: control.female,
        });
        let subjects: Vec<StudySubject> = case_subjects.chain(control_subjects).collect();

        Some(TimelineBuilder::build_cph_dataset(&subjects, config))
    }

    /// Baseline cumulative hazard averaged per whole year of age. Ages with
    /// fewer events than the personal-data floor are redacted, and nothing is
    /// returned when every age is redacted.
    fn baseline_hazard_rows(
        endpoint: &str,
        sex: Sex,
        model: &CoxModel,
        timeline: &[TimelineRow],
        config: &AnalysisConfig,
    ) -> Vec<BaselineHazardRow> {
        let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
        for &(age, hazard) in &model.baseline_cumulative_hazard {
            let bucket = buckets.entry(age.round_ties_even() as i64).or_insert((0.0, 0));
            bucket.0 += hazard;
            bucket.1 += 1;
        }

        let event_counts: HashMap<i64, usize> = timeline
            .iter()
            .filter(|row| row.outcome == 1)
            .map(|row| row.stop_age.round_ties_even() as i64)
            .counts();

        let rows: Vec<BaselineHazardRow> = buckets
            .into_iter()
            .map(|(age, (sum, n))| {
                let events = event_counts.get(&age).copied().unwrap_or(0);
                BaselineHazardRow {
                    endpoint: endpoint.to_string(),
                    sex,
                    age: age as f64,
                    baseline_cumulative_hazard: (events >= config.min_subjects_personal_data)
                        .then(|| sum / n as f64),
                }
            })
            .collect();

        if rows.iter().all(|row| row.baseline_cumulative_hazard.is_none()) {
            return Vec::new();
        }
        rows
    }

    fn parameter_rows(
        endpoint: &str,
        sex: Sex,
        model: &CoxModel,
        config: &AnalysisConfig,
    ) -> Vec<ParameterRow> {
        model
            .summary()
            .into_iter()
            .map(|c| ParameterRow {
                endpoint: endpoint.to_string(),
                sex,
                covariate: c.covariate,
                coef: round_to(c.coef, config.n_digits),
                ci95_lower: round_to(c.ci_lower, config.n_digits),
                ci95_upper: round_to(c.ci_upper, config.n_digits),
                p_value: round_to(c.p_value, config.n_digits),
                mean: round_to(c.mean, config.n_digits),
            })
            .collect()
    }

    fn counts_row(
        endpoint: &str,
        sex: Sex,
        exposed: &[Exposure],
        cohort: &[CohortMember],
        exposed_cases: usize,
    ) -> CountsRow {
        let cohort_sex: HashMap<&str, Option<Sex>> = cohort
            .iter()
            .map(|m| (m.personid.as_str(), Sex::from_female(m.female)))
            .collect();
        let exposed_count = exposed
            .iter()
            .filter(|e| cohort_sex.get(e.personid.as_str()) == Some(&Some(sex)))
            .count();

        CountsRow {
            endpoint: endpoint.to_string(),
            sex,
            exposed: exposed_count,
            exposed_cases,
        }
    }
}
