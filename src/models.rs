use crate::{errors::MortalityError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the minimal phenotype table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhenotypeRecord {
    pub personid: String,
    pub birth_year: f64,
    pub death_year: Option<f64>,
    pub female: Option<bool>,
    pub index_person: Option<bool>,
}

/// First occurrence of an endpoint for one subject, joined with the
/// subject's phenotype.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirstEvent {
    pub personid: String,
    pub endpoint: String,
    pub age: f64,
    pub birth_year: f64,
    pub death_year: Option<f64>,
    pub female: Option<bool>,
    pub index_person: Option<bool>,
}

/// Member of the population eligible for control sampling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CohortMember {
    pub personid: String,
    pub birth_year: f64,
    pub death_year: Option<f64>,
    pub female: Option<bool>,
}

/// Calendar year of a subject's first exposure endpoint event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exposure {
    pub personid: String,
    pub exposure_year: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub fn from_female(female: Option<bool>) -> Option<Sex> {
        female.map(|f| if f { Sex::Female } else { Sex::Male })
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Female => write!(f, "female"),
            Sex::Male => write!(f, "male"),
        }
    }
}

/// The role in which a subject enters the case-cohort timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Case,
    Control,
}

/// Identity of one timeline: the same subject may carry both a case and a
/// control timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimelineId {
    pub subject_id: String,
    pub role: Role,
}

impl TimelineId {
    pub fn case(subject_id: impl Into<String>) -> Self {
        Self { subject_id: subject_id.into(), role: Role::Case }
    }

    pub fn control(subject_id: impl Into<String>) -> Self {
        Self { subject_id: subject_id.into(), role: Role::Control }
    }
}

/// Input to the timeline builder: one subject in one role.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySubject {
    pub id: TimelineId,
    pub birth_year: f64,
    pub death_year: Option<f64>,
    pub exposure_year: Option<f64>,
    pub outcome_year: Option<f64>,
    pub weight: f64,
    pub female: Option<bool>,
}

/// Outcome interval of one subject-role on the time-on-study scale.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeInterval {
    pub id: TimelineId,
    pub start: f64,
    pub stop: f64,
    pub outcome: u8,
    pub birth_year: f64,
    pub weight: f64,
    pub female: Option<bool>,
}

/// Time of a valid exposure on the time-on-study scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureEvent {
    pub id: TimelineId,
    pub duration: f64,
    pub exposure: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub id: TimelineId,
    pub start_time: f64,
    pub stop_time: f64,
    pub start_age: f64,
    pub stop_age: f64,
    pub outcome: u8,
    pub exposure: u8,
    pub birth_year: f64,
    pub weight: f64,
    pub female: Option<bool>,
}

impl TimelineRow {
    pub fn start(&self, timescale: Timescale) -> f64 {
        match timescale {
            Timescale::Age => self.start_age,
            Timescale::TimeOnStudy => self.start_time,
        }
    }

    pub fn stop(&self, timescale: Timescale) -> f64 {
        match timescale {
            Timescale::Age => self.stop_age,
            Timescale::TimeOnStudy => self.stop_time,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub rows: Vec<TimelineRow>,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timescale {
    Age,
    TimeOnStudy,
}

/// Sampled case carrying its case-cohort entry and exit years.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCase {
    pub personid: String,
    pub birth_year: f64,
    pub death_year: Option<f64>,
    pub female: Option<bool>,
    pub start: f64,
    pub stop: f64,
    pub outcome: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseCohortWeights {
    pub cases: f64,
    pub controls: f64,
}

impl CaseCohortWeights {
    pub fn is_defined(&self) -> bool {
        self.cases.is_finite() && self.controls.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRow {
    pub endpoint: String,
    pub sex: Sex,
    pub covariate: String,
    pub coef: f64,
    pub ci95_lower: f64,
    pub ci95_upper: f64,
    pub p_value: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineHazardRow {
    pub endpoint: String,
    pub sex: Sex,
    pub age: f64,
    pub baseline_cumulative_hazard: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountsRow {
    pub endpoint: String,
    pub sex: Sex,
    pub exposed: usize,
    pub exposed_cases: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointResults {
    pub params: Vec<ParameterRow>,
    pub baseline_hazard: Vec<BaselineHazardRow>,
    pub counts: Vec<CountsRow>,
}

impl EndpointResults {
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.baseline_hazard.is_empty() && self.counts.is_empty()
    }

    pub fn extend(&mut self, other: EndpointResults) {
        self.params.extend(other.params);
        self.baseline_hazard.extend(other.baseline_hazard);
        self.counts.extend(other.counts);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedEndpoint {
    pub endpoint: String,
    pub failure_reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MortalityResults {
    pub results: EndpointResults,
    pub analysed_endpoints: usize,
    pub failed_endpoints: Vec<FailedEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFiguresRow {
    pub endpoint: String,
    pub nindivs_female: Option<usize>,
    pub nindivs_male: Option<usize>,
    pub nindivs_all: Option<usize>,
    pub mean_age_female: Option<f64>,
    pub mean_age_male: Option<f64>,
    pub mean_age_all: Option<f64>,
    pub prevalence_female: Option<f64>,
    pub prevalence_male: Option<f64>,
    pub prevalence_all: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub followup_start: f64,
    pub followup_end: f64,
    /// Statistics derived from fewer subjects than this are redacted.
    pub min_subjects_personal_data: usize,
    /// Minimum exposed cases per sex before a model is attempted.
    pub min_subjects_survival_analysis: usize,
    /// Every outcome × exposure cell must hold more distinct subjects than this.
    pub min_subjects_contingency: usize,
    pub n_cases: usize,
    pub controls_per_case: usize,
    pub n_digits: i32,
    pub outcome_endpoint: String,
    pub index_persons: bool,
    pub n_workers: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            followup_start: 1998.0,
            followup_end: 2019.0,
            min_subjects_personal_data: 5,
            min_subjects_survival_analysis: 100,
            min_subjects_contingency: 100,
            n_cases: 250_000,
            controls_per_case: 2,
            n_digits: 4,
            outcome_endpoint: "DEATH".to_string(),
            index_persons: false,
            n_workers: None,
            seed: None,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.followup_start < self.followup_end) {
            return Err(MortalityError::InvalidConfig(format!(
                "follow-up start ({}) must precede follow-up end ({})",
                self.followup_start, self.followup_end
            )));
        }
        if self.controls_per_case == 0 {
            return Err(MortalityError::InvalidConfig(
                "controls_per_case must be at least 1".to_string(),
            ));
        }
        if self.n_workers == Some(0) {
            return Err(MortalityError::InvalidConfig(
                "n_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
