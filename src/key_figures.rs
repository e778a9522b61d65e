use crate::models::*;
use itertools::Itertools;
use std::collections::{BTreeMap, HashSet};

/// Per endpoint and sex (`None` for unknown sex).
#[derive(Debug, Clone, PartialEq)]
struct SexFigures {
    sex: Option<Sex>,
    nindivs: usize,
    mean_age: f64,
    prevalence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Figures {
    nindivs: Option<usize>,
    mean_age: Option<f64>,
    prevalence: Option<f64>,
}

pub struct KeyFiguresCalculator;

impl KeyFiguresCalculator {
    /// Number of individuals, mean age at first event and unadjusted
    /// prevalence per endpoint for females, males and everyone.
    pub fn compute_key_figures(
        first_events: &[FirstEvent],
        minimal_phenotype: &[PhenotypeRecord],
        index_persons: bool,
        config: &AnalysisConfig,
    ) -> Vec<KeyFiguresRow> {
        log::info!(
            "Computing key figures{}",
            if index_persons { " for index persons" } else { "" }
        );

        let phenotype: Vec<&PhenotypeRecord> = minimal_phenotype
            .iter()
            .filter(|p| !index_persons || p.index_person == Some(true))
            .collect();
        let events: Vec<&FirstEvent> = first_events
            .iter()
            .filter(|e| !index_persons || e.index_person == Some(true))
            .collect();

        // Unknown-sex total comes from the first events
        let n_female = phenotype.iter().filter(|p| p.female == Some(true)).count();
        let n_male = phenotype.iter().filter(|p| p.female == Some(false)).count();
        let n_unknown = events
            .iter()
            .filter(|e| e.female.is_none())
            .map(|e| e.personid.as_str())
            .collect::<HashSet<_>>()
            .len();
        let total = |sex: Option<Sex>| match sex {
            Some(Sex::Female) => n_female,
            Some(Sex::Male) => n_male,
            None => n_unknown,
        };

        let by_endpoint: BTreeMap<&str, Vec<SexFigures>> = events
            .iter()
            .map(|e| ((e.endpoint.as_str(), Sex::from_female(e.female)), e.age))
            .into_group_map()
            .into_iter()
            .map(|((endpoint, sex), ages)| {
                let nindivs = ages.len();
                let figures = SexFigures {
                    sex,
                    nindivs,
                    mean_age: ages.iter().sum::<f64>() / nindivs as f64,
                    prevalence: match total(sex) {
                        0 => None,
                        n => Some(nindivs as f64 / n as f64),
                    },
                };
                (endpoint, figures)
            })
            .into_group_map()
            .into_iter()
            .collect();

        by_endpoint
            .into_iter()
            .map(|(endpoint, figures)| {
                let female = Self::figures_for(&figures, Some(Sex::Female));
                let male = Self::figures_for(&figures, Some(Sex::Male));
                let all = Self::figures_for_all(&figures);

                let [female, male, all] =
                    [female, male, all].map(|f| Self::redact(f, config.min_subjects_personal_data));

                KeyFiguresRow {
                    endpoint: endpoint.to_string(),
                    nindivs_female: female.nindivs,
                    nindivs_male: male.nindivs,
                    nindivs_all: all.nindivs,
                    mean_age_female: female.mean_age,
                    mean_age_male: male.mean_age,
                    mean_age_all: all.mean_age,
                    prevalence_female: female.prevalence,
                    prevalence_male: male.prevalence,
                    prevalence_all: all.prevalence,
                }
            })
            .collect()
    }

    fn figures_for(figures: &[SexFigures], sex: Option<Sex>) -> Figures {
        figures
            .iter()
            .find(|f| f.sex == sex)
            .map(|f| Figures {
                nindivs: Some(f.nindivs),
                mean_age: Some(f.mean_age),
                prevalence: f.prevalence,
            })
            .unwrap_or_default()
    }

    /// Summed count, with mean age and prevalence averaged over the sexes
    /// weighted by their share of the endpoint's events.
    fn figures_for_all(figures: &[SexFigures]) -> Figures {
        let n_endpoint: usize = figures.iter().map(|f| f.nindivs).sum();
        let share = |f: &SexFigures| f.nindivs as f64 / n_endpoint as f64;

        let mean_age = figures.iter().map(|f| share(f) * f.mean_age).sum();
        let prevalence = figures
            .iter()
            .map(|f| f.prevalence.map(|p| share(f) * p))
            .sum::<Option<f64>>();

        Figures {
            nindivs: Some(n_endpoint),
            mean_age: Some(mean_age),
            prevalence,
        }
    }

    fn redact(figures: Figures, min_subjects: usize) -> Figures {
        match figures.nindivs {
            Some(n) if n < min_subjects => Figures::default(),
            _ => figures,
        }
    }
}
