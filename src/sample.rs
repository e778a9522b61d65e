use crate::models::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

pub struct Sampler;

impl Sampler {
    /// Draw `n_controls` members uniformly from the cohort, or the whole
    /// cohort when it is not larger than the request.
    pub fn sample_controls<R: Rng + ?Sized>(
        cohort: &[CohortMember],
        n_controls: usize,
        rng: &mut R,
    ) -> Vec<CohortMember> {
        let controls: Vec<CohortMember> = if n_controls < cohort.len() {
            cohort.choose_multiple(rng, n_controls).cloned().collect()
        } else {
            cohort.to_vec()
        };
        log::debug!("{} controls sampled", controls.len());
        controls
    }

    /// Select the cases of `endpoint`, downsampled to at most `n_cases`.
    ///
    /// Returns the sampled cases together with the ids of every case before
    /// downsampling, which the case-cohort weights are computed against.
    pub fn sample_cases<R: Rng + ?Sized>(
        all_cases: &[FirstEvent],
        endpoint: &str,
        n_cases: usize,
        followup_start: f64,
        rng: &mut R,
    ) -> (Vec<SampledCase>, Vec<String>) {
        let cases: Vec<&FirstEvent> = all_cases
            .iter()
            .filter(|event| event.endpoint == endpoint)
            .collect();

        let caseids_total: Vec<String> = cases.iter().map(|c| c.personid.clone()).collect();

        let selected: Vec<&FirstEvent> = if n_cases < cases.len() {
            cases.choose_multiple(rng, n_cases).copied().collect()
        } else {
            cases
        };

        let sampled: Vec<SampledCase> = selected
            .into_iter()
            .map(|case| SampledCase {
                personid: case.personid.clone(),
                birth_year: case.birth_year,
                death_year: case.death_year,
                female: case.female,
                start: case.birth_year.max(followup_start),
                stop: case.birth_year + case.age,
                outcome: 1,
            })
            .collect();

        log::debug!("{} cases sampled", sampled.len());
        (sampled, caseids_total)
    }

    /// Inverse sampling-fraction weights for cases and for non-case controls.
    ///
    /// A zero denominator leaves the weights undefined: both come back as NaN.
    pub fn calculate_case_cohort_weights(
        caseids: &[String],
        controlids: &[String],
        sampled_caseids: &[String],
        sampled_controlids: &[String],
    ) -> CaseCohortWeights {
        let case_set: HashSet<&str> = caseids.iter().map(String::as_str).collect();

        let non_cases = controlids
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .difference(&case_set)
            .count();
        let non_cases_in_sample = sampled_controlids
            .iter()
            .map(String::as_str)
            .collect::<HashSet<_>>()
            .difference(&case_set)
            .count();

        if caseids.is_empty() || sampled_caseids.is_empty() {
            log::warn!("Division by zero: no cases to weight");
            return CaseCohortWeights { cases: f64::NAN, controls: f64::NAN };
        }
        if non_cases == 0 || non_cases_in_sample == 0 {
            log::warn!("Division by zero: no non-cases among controls");
            return CaseCohortWeights { cases: f64::NAN, controls: f64::NAN };
        }

        let case_fraction = sampled_caseids.len() as f64 / caseids.len() as f64;
        let control_fraction = non_cases_in_sample as f64 / non_cases as f64;

        CaseCohortWeights {
            cases: 1.0 / case_fraction,
            controls: 1.0 / control_fraction,
        }
    }
}
