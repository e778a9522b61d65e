use crate::{errors::MortalityError, Result};
use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::BTreeMap;

/// Counting-process survival data: one row per at-risk interval `(entry, stop]`.
#[derive(Debug, Clone)]
pub struct CoxData {
    entry: Vec<f64>,
    stop: Vec<f64>,
    events: Vec<bool>,
    weights: Vec<f64>,
    covariates: DMatrix<f64>,
    clusters: Vec<usize>,
    covariate_names: Vec<String>,
}

impl CoxData {
    pub fn new(
        entry: Vec<f64>,
        stop: Vec<f64>,
        events: Vec<bool>,
        weights: Vec<f64>,
        covariates: DMatrix<f64>,
        clusters: Vec<usize>,
        covariate_names: Vec<String>,
    ) -> Result<Self> {
        let n = stop.len();
        if entry.len() != n
            || events.len() != n
            || weights.len() != n
            || clusters.len() != n
            || covariates.nrows() != n
        {
            return Err(MortalityError::CalculationError(format!(
                "row count mismatch: {} stops, {} entries, {} events, {} weights, {} clusters, {} covariate rows",
                n,
                entry.len(),
                events.len(),
                weights.len(),
                clusters.len(),
                covariates.nrows()
            )));
        }
        if covariate_names.len() != covariates.ncols() {
            return Err(MortalityError::CalculationError(format!(
                "{} covariate names for {} covariate columns",
                covariate_names.len(),
                covariates.ncols()
            )));
        }
        if entry.iter().zip(stop.iter()).any(|(e, s)| !(e < s) || !s.is_finite()) {
            return Err(MortalityError::CalculationError(
                "every interval needs a finite stop after its entry".to_string(),
            ));
        }
        if weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(MortalityError::CalculationError(
                "weights must be positive and finite".to_string(),
            ));
        }
        if !events.iter().any(|&e| e) {
            return Err(MortalityError::InsufficientData("no events to fit".to_string()));
        }

        Ok(Self { entry, stop, events, weights, covariates, clusters, covariate_names })
    }

    pub fn n_samples(&self) -> usize {
        self.stop.len()
    }

    pub fn n_features(&self) -> usize {
        self.covariates.ncols()
    }

    /// Unweighted column means of the covariate matrix
    pub fn covariate_means(&self) -> DVector<f64> {
        let n = self.n_samples().max(1) as f64;
        DVector::from_iterator(
            self.n_features(),
            self.covariates.column_iter().map(|column| column.sum() / n),
        )
    }
}

#[derive(Debug, Clone)]
pub struct CoefficientSummary {
    pub covariate: String,
    pub coef: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub p_value: f64,
    pub mean: f64,
}

/// Fitted weighted Cox proportional-hazards model.
#[derive(Debug, Clone)]
pub struct CoxModel {
    pub covariate_names: Vec<String>,
    pub coefficients: DVector<f64>,
    pub standard_errors: DVector<f64>,
    pub ci_lower: DVector<f64>,
    pub ci_upper: DVector<f64>,
    pub p_values: DVector<f64>,
    pub covariate_means: DVector<f64>,
    /// Breslow cumulative hazard at the covariate means, `(time, hazard)`
    /// for every distinct stop time.
    pub baseline_cumulative_hazard: Vec<(f64, f64)>,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl CoxModel {
    pub fn summary(&self) -> Vec<CoefficientSummary> {
        self.covariate_names
            .iter()
            .enumerate()
            .map(|(j, name)| CoefficientSummary {
                covariate: name.clone(),
                coef: self.coefficients[j],
                ci_lower: self.ci_lower[j],
                ci_upper: self.ci_upper[j],
                p_value: self.p_values[j],
                mean: self.covariate_means[j],
            })
            .collect()
    }

    pub fn hazard_ratios(&self) -> DVector<f64> {
        self.coefficients.map(f64::exp)
    }
}

/// Newton-Raphson fitter for the weighted, left-truncated Cox partial
/// likelihood with Breslow ties and cluster-robust variance.
#[derive(Debug, Clone)]
pub struct CoxFitter {
    max_iterations: usize,
    tolerance: f64,
    alpha: f64,
}

impl Default for CoxFitter {
    fn default() -> Self {
        Self { max_iterations: 50, tolerance: 1e-9, alpha: 0.05 }
    }
}

/// Row orderings shared by every likelihood evaluation.
struct RiskSetIndex {
    event_times: Vec<f64>,
    event_groups: Vec<Vec<usize>>,
    by_entry: Vec<usize>,
    by_stop: Vec<usize>,
}

/// Log partial likelihood, its derivatives, and the per-event-time risk set
/// summaries they were built from.
struct Evaluation {
    log_likelihood: f64,
    gradient: DVector<f64>,
    hessian: DMatrix<f64>,
    hazard_increments: Vec<f64>,
    weighted_means: Vec<DVector<f64>>,
}

impl CoxFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&self, data: &CoxData) -> Result<CoxModel> {
        let means = data.covariate_means();
        let mut centered = data.covariates.clone();
        for (j, mut column) in centered.column_iter_mut().enumerate() {
            column.add_scalar_mut(-means[j]);
        }
        if let Some(j) = (0..data.n_features())
            .find(|&j| centered.column(j).iter().all(|x| x.abs() < 1e-12))
        {
            return Err(MortalityError::InsufficientData(format!(
                "covariate {} has no variation",
                data.covariate_names[j]
            )));
        }

        let rows: Vec<DVector<f64>> = (0..data.n_samples())
            .map(|i| centered.row(i).transpose())
            .collect();
        let index = Self::risk_set_index(data);

        let p = data.n_features();
        let mut beta = DVector::zeros(p);
        let mut current = Self::evaluate(data, &rows, &index, &beta)?;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.max_iterations {
            iterations += 1;

            let information = -&current.hessian;
            let delta = information
                .cholesky()
                .ok_or_else(|| {
                    MortalityError::MathError(
                        "information matrix is not positive definite".to_string(),
                    )
                })?
                .solve(&current.gradient);

            // halve the step until the likelihood stops decreasing
            let mut step = 1.0;
            let mut candidate_beta = &beta + &delta;
            let mut candidate = Self::evaluate(data, &rows, &index, &candidate_beta)?;
            let mut halvings = 0;
            while !Self::improves(&current, &candidate) && halvings < 30 {
                step *= 0.5;
                candidate_beta = &beta + &delta * step;
                candidate = Self::evaluate(data, &rows, &index, &candidate_beta)?;
                halvings += 1;
            }

            let step_norm = (&delta * step).norm();
            beta = candidate_beta;
            current = candidate;

            if step_norm < self.tolerance {
                converged = true;
                break;
            }
        }

        if !converged {
            log::warn!(
                "Cox fit did not converge in {} iterations (log-likelihood {:.6})",
                iterations,
                current.log_likelihood
            );
        }

        let information = -&current.hessian;
        let naive_variance = information
            .cholesky()
            .ok_or_else(|| {
                MortalityError::MathError("information matrix is singular at the optimum".to_string())
            })?
            .inverse();

        let residuals = Self::score_residuals(data, &rows, &index, &current, &beta);
        let robust_variance = Self::sandwich(&naive_variance, &residuals, &data.clusters);

        let standard_errors = DVector::from_iterator(
            p,
            robust_variance.diagonal().iter().map(|v| v.max(0.0).sqrt()),
        );

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| MortalityError::MathError(format!("standard normal: {}", e)))?;
        let z = normal.inverse_cdf(1.0 - self.alpha / 2.0);

        let ci_lower = &beta - &standard_errors * z;
        let ci_upper = &beta + &standard_errors * z;
        let p_values = DVector::from_iterator(
            p,
            beta.iter().zip(standard_errors.iter()).map(|(b, se)| {
                if *se > 0.0 {
                    2.0 * (1.0 - normal.cdf((b / se).abs()))
                } else {
                    f64::NAN
                }
            }),
        );

        let baseline_cumulative_hazard = Self::baseline_cumulative_hazard(data, &index, &current);

        Ok(CoxModel {
            covariate_names: data.covariate_names.clone(),
            coefficients: beta,
            standard_errors,
            ci_lower,
            ci_upper,
            p_values,
            covariate_means: means,
            baseline_cumulative_hazard,
            log_likelihood: current.log_likelihood,
            iterations,
            converged,
        })
    }

    fn improves(current: &Evaluation, candidate: &Evaluation) -> bool {
        let slack = 1e-10 * current.log_likelihood.abs().max(1.0);
        candidate.log_likelihood.is_finite()
            && candidate.log_likelihood >= current.log_likelihood - slack
    }

    fn risk_set_index(data: &CoxData) -> RiskSetIndex {
        let n = data.n_samples();

        let mut event_rows: Vec<usize> = (0..n).filter(|&i| data.events[i]).collect();
        event_rows.sort_by(|&a, &b| data.stop[a].total_cmp(&data.stop[b]));

        let mut event_times: Vec<f64> = Vec::new();
        let mut event_groups: Vec<Vec<usize>> = Vec::new();
        for i in event_rows {
            match event_times.last() {
                Some(&t) if t == data.stop[i] => {
                    if let Some(group) = event_groups.last_mut() {
                        group.push(i);
                    }
                }
                _ => {
                    event_times.push(data.stop[i]);
                    event_groups.push(vec![i]);
                }
            }
        }

        let mut by_entry: Vec<usize> = (0..n).collect();
        by_entry.sort_by(|&a, &b| data.entry[a].total_cmp(&data.entry[b]));
        let mut by_stop: Vec<usize> = (0..n).collect();
        by_stop.sort_by(|&a, &b| data.stop[a].total_cmp(&data.stop[b]));

        RiskSetIndex { event_times, event_groups, by_entry, by_stop }
    }

    /// Sweep the event times in order, maintaining the weighted risk-set sums
    /// of `exp(eta)`, `x exp(eta)` and `x x' exp(eta)`. A row is at risk at
    /// time t when `entry < t <= stop`.
    fn evaluate(
        data: &CoxData,
        rows: &[DVector<f64>],
        index: &RiskSetIndex,
        beta: &DVector<f64>,
    ) -> Result<Evaluation> {
        let n = data.n_samples();
        let p = beta.len();
        let eta: Vec<f64> = rows.iter().map(|x| x.dot(beta)).collect();
        let risk: Vec<f64> = eta.iter().map(|e| e.exp()).collect();

        let mut s0 = 0.0;
        let mut s1 = DVector::<f64>::zeros(p);
        let mut s2 = DMatrix::<f64>::zeros(p, p);
        let (mut entered, mut exited) = (0, 0);

        let mut log_likelihood = 0.0;
        let mut gradient = DVector::<f64>::zeros(p);
        let mut hessian = DMatrix::<f64>::zeros(p, p);
        let mut hazard_increments = Vec::with_capacity(index.event_times.len());
        let mut weighted_means = Vec::with_capacity(index.event_times.len());

        for (k, &t) in index.event_times.iter().enumerate() {
            while entered < n && data.entry[index.by_entry[entered]] < t {
                let i = index.by_entry[entered];
                let wr = data.weights[i] * risk[i];
                s0 += wr;
                s1 += &rows[i] * wr;
                s2 += &rows[i] * rows[i].transpose() * wr;
                entered += 1;
            }
            while exited < n && data.stop[index.by_stop[exited]] < t {
                let i = index.by_stop[exited];
                let wr = data.weights[i] * risk[i];
                s0 -= wr;
                s1 -= &rows[i] * wr;
                s2 -= &rows[i] * rows[i].transpose() * wr;
                exited += 1;
            }

            if !(s0 > 0.0) {
                return Err(MortalityError::MathError(format!(
                    "empty risk set at event time {}",
                    t
                )));
            }

            let mut events_weight = 0.0;
            let mut events_x = DVector::<f64>::zeros(p);
            for &i in &index.event_groups[k] {
                events_weight += data.weights[i];
                events_x += &rows[i] * data.weights[i];
                log_likelihood += data.weights[i] * eta[i];
            }

            let x_bar = &s1 / s0;
            log_likelihood -= events_weight * s0.ln();
            gradient += events_x - &x_bar * events_weight;
            hessian -= (&s2 / s0 - &x_bar * x_bar.transpose()) * events_weight;

            hazard_increments.push(events_weight / s0);
            weighted_means.push(x_bar);
        }

        Ok(Evaluation { log_likelihood, gradient, hessian, hazard_increments, weighted_means })
    }

    /// Weighted score residual of every row; they sum to the score vector.
    fn score_residuals(
        data: &CoxData,
        rows: &[DVector<f64>],
        index: &RiskSetIndex,
        evaluation: &Evaluation,
        beta: &DVector<f64>,
    ) -> Vec<DVector<f64>> {
        let p = beta.len();
        let k = index.event_times.len();

        let mut cumulative_hazard = vec![0.0; k + 1];
        let mut cumulative_mean = vec![DVector::<f64>::zeros(p); k + 1];
        for j in 0..k {
            let increment = evaluation.hazard_increments[j];
            cumulative_hazard[j + 1] = cumulative_hazard[j] + increment;
            cumulative_mean[j + 1] = &cumulative_mean[j] + &evaluation.weighted_means[j] * increment;
        }

        (0..data.n_samples())
            .map(|i| {
                let lo = index.event_times.partition_point(|&t| t <= data.entry[i]);
                let hi = index.event_times.partition_point(|&t| t <= data.stop[i]);
                let risk = rows[i].dot(beta).exp();

                let hazard = cumulative_hazard[hi] - cumulative_hazard[lo];
                let mean = &cumulative_mean[hi] - &cumulative_mean[lo];
                let mut residual = -(&rows[i] * hazard - mean) * risk;

                if data.events[i] && hi > 0 {
                    residual += &rows[i] - &evaluation.weighted_means[hi - 1];
                }
                residual * data.weights[i]
            })
            .collect()
    }

    fn sandwich(
        naive_variance: &DMatrix<f64>,
        residuals: &[DVector<f64>],
        clusters: &[usize],
    ) -> DMatrix<f64> {
        let p = naive_variance.nrows();
        let mut cluster_scores: BTreeMap<usize, DVector<f64>> = BTreeMap::new();
        for (residual, cluster) in residuals.iter().zip(clusters.iter()) {
            *cluster_scores
                .entry(*cluster)
                .or_insert_with(|| DVector::zeros(p)) += residual;
        }

        let mut meat = DMatrix::<f64>::zeros(p, p);
        for score in cluster_scores.values() {
            meat += score * score.transpose();
        }

        naive_variance * meat * naive_variance
    }

    fn baseline_cumulative_hazard(
        data: &CoxData,
        index: &RiskSetIndex,
        evaluation: &Evaluation,
    ) -> Vec<(f64, f64)> {
        let mut times = data.stop.clone();
        times.sort_by(f64::total_cmp);
        times.dedup();

        let mut cumulative = 0.0;
        let mut next_event = 0;
        times
            .into_iter()
            .map(|t| {
                while next_event < index.event_times.len() && index.event_times[next_event] <= t {
                    cumulative += evaluation.hazard_increments[next_event];
                    next_event += 1;
                }
                (t, cumulative)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_covariate(
        entry: Vec<f64>,
        stop: Vec<f64>,
        events: Vec<bool>,
        weights: Vec<f64>,
        x: Vec<f64>,
    ) -> CoxData {
        let n = stop.len();
        CoxData::new(
            entry,
            stop,
            events,
            weights,
            DMatrix::from_column_slice(n, 1, &x),
            (0..n).collect(),
            vec!["exposure".to_string()],
        )
        .unwrap()
    }

    fn untied_four() -> CoxData {
        single_covariate(
            vec![0.0; 4],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![true; 4],
            vec![1.0; 4],
            vec![1.0, 0.0, 1.0, 0.0],
        )
    }

    #[test]
    fn test_recovers_closed_form_estimate() {
        // score equation reduces to u^2 - u - 4 = 0 with u = exp(beta)
        let expected = ((1.0 + 17f64.sqrt()) / 2.0).ln();
        let model = CoxFitter::new().fit(&untied_four()).unwrap();

        assert!(model.converged);
        assert_relative_eq!(model.coefficients[0], expected, epsilon = 1e-6);
        assert_relative_eq!(model.hazard_ratios()[0], expected.exp(), epsilon = 1e-5);
        assert!(model.standard_errors[0] > 0.0);
        assert!(model.ci_lower[0] < model.coefficients[0]);
        assert!(model.ci_upper[0] > model.coefficients[0]);
        assert!(model.p_values[0] > 0.0 && model.p_values[0] < 1.0);
    }

    #[test]
    fn test_baseline_hazard_is_reported_at_covariate_means() {
        let model = CoxFitter::new().fit(&untied_four()).unwrap();
        let beta = model.coefficients[0];
        let first = 1.0 / (2.0 * (beta / 2.0).exp() + 2.0 * (-beta / 2.0).exp());

        assert_relative_eq!(model.covariate_means[0], 0.5);
        assert_eq!(model.baseline_cumulative_hazard.len(), 4);
        assert_relative_eq!(model.baseline_cumulative_hazard[0].0, 1.0);
        assert_relative_eq!(model.baseline_cumulative_hazard[0].1, first, epsilon = 1e-6);
        assert!(model
            .baseline_cumulative_hazard
            .windows(2)
            .all(|w| w[1].1 > w[0].1));
    }

    #[test]
    fn test_uniform_weight_scaling_leaves_coefficients_unchanged() {
        let entry = vec![0.0, 0.0, 0.5, 0.0, 1.0, 0.0, 0.0, 0.2];
        let stop = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let events = vec![true, false, true, true, false, true, true, false];
        let x = vec![1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0];

        let unit = single_covariate(entry.clone(), stop.clone(), events.clone(), vec![1.0; 8], x.clone());
        let scaled = single_covariate(entry, stop, events, vec![3.5; 8], x);

        let a = CoxFitter::new().fit(&unit).unwrap();
        let b = CoxFitter::new().fit(&scaled).unwrap();
        assert_relative_eq!(a.coefficients[0], b.coefficients[0], epsilon = 1e-8);
    }

    #[test]
    fn test_rows_entering_after_last_event_do_not_change_fit() {
        let base = untied_four();
        let extended = single_covariate(
            vec![0.0, 0.0, 0.0, 0.0, 4.5],
            vec![1.0, 2.0, 3.0, 4.0, 6.0],
            vec![true, true, true, true, false],
            vec![1.0; 5],
            vec![1.0, 0.0, 1.0, 0.0, 1.0],
        );

        let a = CoxFitter::new().fit(&base).unwrap();
        let b = CoxFitter::new().fit(&extended).unwrap();
        assert_relative_eq!(a.coefficients[0], b.coefficients[0], epsilon = 1e-8);
    }

    #[test]
    fn test_weighted_score_residuals_sum_to_zero_at_optimum() {
        let n = 12;
        let entry: Vec<f64> = (0..n).map(|i| (i % 3) as f64 * 0.5).collect();
        let stop: Vec<f64> = (0..n).map(|i| 2.0 + i as f64 * 0.75).collect();
        let events: Vec<bool> = (0..n).map(|i| i % 4 != 3).collect();
        let weights: Vec<f64> = (0..n).map(|i| if i % 2 == 0 { 1.0 } else { 2.5 }).collect();
        let mut values = Vec::with_capacity(n * 2);
        values.extend((0..n).map(|i| (i % 2) as f64));
        values.extend((0..n).map(|i| 1940.0 + ((i * 7) % 11) as f64));

        let data = CoxData::new(
            entry,
            stop,
            events,
            weights,
            DMatrix::from_column_slice(n, 2, &values),
            (0..n).map(|i| i / 2).collect(),
            vec!["exposure".to_string(), "birth_year".to_string()],
        )
        .unwrap();

        let fitter = CoxFitter::new();
        let model = fitter.fit(&data).unwrap();
        assert!(model.converged);

        let means = data.covariate_means();
        let rows: Vec<DVector<f64>> = (0..n)
            .map(|i| data.covariates.row(i).transpose() - &means)
            .collect();
        let index = CoxFitter::risk_set_index(&data);
        let evaluation = CoxFitter::evaluate(&data, &rows, &index, &model.coefficients).unwrap();
        let residuals =
            CoxFitter::score_residuals(&data, &rows, &index, &evaluation, &model.coefficients);

        let total = residuals.iter().fold(DVector::zeros(2), |acc, r| acc + r);
        assert!(total.norm() < 1e-6);
        assert_relative_eq!((total - &evaluation.gradient).norm(), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_robust_variance_sums_scores_within_clusters() {
        // six subjects, each split into a pre- and post-exposure interval
        let n = 12;
        let split: Vec<f64> = (0..6).map(|k| 1.0 + k as f64 * 0.4).collect();
        let stop_times = [3.1, 5.4, 2.7, 6.2, 4.5, 3.8];
        let outcome = [true, true, false, true, true, false];
        let mut entry = Vec::with_capacity(n);
        let mut stop = Vec::with_capacity(n);
        let mut events = Vec::with_capacity(n);
        let mut x = Vec::with_capacity(n);
        for k in 0..6 {
            entry.extend([0.0, split[k]]);
            stop.extend([split[k], stop_times[k]]);
            events.extend([k == 2, outcome[k]]);
            x.extend([0.0, 1.0]);
        }
        let weights: Vec<f64> = (0..n).map(|i| if i % 4 < 2 { 1.0 } else { 2.0 }).collect();

        let build = |clusters: Vec<usize>| {
            CoxData::new(
                entry.clone(),
                stop.clone(),
                events.clone(),
                weights.clone(),
                DMatrix::from_column_slice(n, 1, &x),
                clusters,
                vec!["exposure".to_string()],
            )
            .unwrap()
        };
        let per_row = build((0..n).collect());
        let per_subject = build((0..n).map(|i| i / 2).collect());

        let fitter = CoxFitter::new();
        let a = fitter.fit(&per_row).unwrap();
        let b = fitter.fit(&per_subject).unwrap();
        assert_relative_eq!(a.coefficients[0], b.coefficients[0], epsilon = 1e-10);
        assert!((a.standard_errors[0] - b.standard_errors[0]).abs() > 1e-6);

        // per-row clusters reduce to I^-1 (sum r r') I^-1
        let means = per_row.covariate_means();
        let rows: Vec<DVector<f64>> = (0..n)
            .map(|i| per_row.covariates.row(i).transpose() - &means)
            .collect();
        let index = CoxFitter::risk_set_index(&per_row);
        let evaluation = CoxFitter::evaluate(&per_row, &rows, &index, &a.coefficients).unwrap();
        let residuals =
            CoxFitter::score_residuals(&per_row, &rows, &index, &evaluation, &a.coefficients);
        let information = -evaluation.hessian[(0, 0)];
        let meat: f64 = residuals.iter().map(|r| r[0] * r[0]).sum();
        assert_relative_eq!(
            a.standard_errors[0],
            meat.sqrt() / information,
            max_relative = 1e-8
        );
    }

    #[test]
    fn test_invalid_intervals_are_rejected() {
        let result = CoxData::new(
            vec![2.0],
            vec![1.0],
            vec![true],
            vec![1.0],
            DMatrix::from_column_slice(1, 1, &[1.0]),
            vec![0],
            vec!["exposure".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_nan_weights_are_rejected() {
        let result = CoxData::new(
            vec![0.0, 0.0],
            vec![1.0, 2.0],
            vec![true, false],
            vec![f64::NAN, f64::NAN],
            DMatrix::from_column_slice(2, 1, &[1.0, 0.0]),
            vec![0, 1],
            vec!["exposure".to_string()],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_constant_covariate_is_rejected() {
        let data = single_covariate(
            vec![0.0; 4],
            vec![1.0, 2.0, 3.0, 4.0],
            vec![true, false, true, false],
            vec![1.0; 4],
            vec![1950.0; 4],
        );
        assert!(matches!(
            CoxFitter::new().fit(&data),
            Err(MortalityError::InsufficientData(_))
        ));
    }
}
