//! Fixed-horizon delta worker.
//!
//! Compares a treatment sample against a control sample and reports the
//! difference of means with confidence bounds, either from a normal
//! approximation (Welch standard error) or from bootstrap resampling.

use rand::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::normal::normal_quantile;
use crate::percentiles::compute_percentile;
use crate::{DEFAULT_MIN_OBSERVATIONS, DEFAULT_NRUNS, DEFAULT_PERCENTILES};

/// Configuration shared by all delta workers
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Analytic (normal) confidence intervals instead of resampling
    pub assume_normal: bool,
    /// Confidence-bound percentiles to report (e.g. `[2.5, 97.5]`)
    pub percentiles: Vec<f64>,
    /// Below this per-sample observation count, results are NaN
    pub min_observations: usize,
    /// Bootstrap iteration count when `assume_normal` is false
    pub nruns: usize,
    /// Report bounds as signed offsets from the estimate
    pub relative: bool,
    /// Parallel bootstrap resampling
    pub parallel: bool,
    /// Significance level for sequential stopping
    pub alpha: f64,
    /// Fraction of the planned sample already collected (group-sequential)
    pub information_fraction: f64,
    /// Upper cap on the adjusted sequential z-boundary
    pub cap: f64,
    /// Prior width relative to the pooled deviation (Bayes factor)
    pub prior_scale: f64,
    /// Credible-interval width threshold relative to the control mean
    /// (Bayes precision)
    pub precision: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            assume_normal: true,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            min_observations: DEFAULT_MIN_OBSERVATIONS,
            nruns: DEFAULT_NRUNS,
            relative: false,
            parallel: true,
            alpha: 0.05,
            information_fraction: 1.0,
            cap: 8.0,
            prior_scale: 1.0,
            precision: 0.08,
        }
    }
}

/// One confidence bound, keyed by its percentile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CiBound {
    /// Percentile in `[0, 100]`
    pub percentile: f64,
    /// Bound value (absolute, or an offset from the estimate when `relative`)
    pub value: f64,
}

/// Output of one two-sample comparison
#[derive(Debug, Clone, Serialize)]
pub struct DeltaStatistics {
    /// Difference of means, treatment minus control
    pub estimate: f64,
    /// Confidence bounds at the requested percentiles
    pub confidence_interval: Vec<CiBound>,
    /// Non-NaN observation count of the treatment sample
    pub sample_size_x: usize,
    /// Non-NaN observation count of the control sample
    pub sample_size_y: usize,
    /// Treatment mean
    pub mean_x: f64,
    /// Control mean
    pub mean_y: f64,
    /// Early-stopping decision, present only for sequential/Bayesian workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<bool>,
}

impl DeltaStatistics {
    /// All-NaN statistics for a below-threshold comparison. Sample sizes stay
    /// factual; they are the evidence for the NaN.
    pub(crate) fn below_threshold(percentiles: &[f64], ss_x: usize, ss_y: usize) -> Self {
        Self {
            estimate: f64::NAN,
            confidence_interval: percentiles
                .iter()
                .map(|&p| CiBound {
                    percentile: p,
                    value: f64::NAN,
                })
                .collect(),
            sample_size_x: ss_x,
            sample_size_y: ss_y,
            mean_x: f64::NAN,
            mean_y: f64::NAN,
            stop: None,
        }
    }

    /// Lowest and highest confidence-bound values, if any were reported.
    pub fn interval(&self) -> Option<(f64, f64)> {
        let lo = self
            .confidence_interval
            .iter()
            .map(|b| b.value)
            .fold(f64::INFINITY, f64::min);
        let hi = self
            .confidence_interval
            .iter()
            .map(|b| b.value)
            .fold(f64::NEG_INFINITY, f64::max);
        if self.confidence_interval.is_empty() {
            None
        } else {
            Some((lo, hi))
        }
    }
}

/// Abstract two-sample comparison
pub trait DeltaWorker: Send + Sync + std::fmt::Debug {
    /// Compare treatment sample `x` against control sample `y`.
    fn compare(&self, x: &[f64], y: &[f64]) -> DeltaStatistics;
}

/// Errors from worker selection
#[derive(Debug, Clone, Error)]
pub enum StatsError {
    #[error("delta method `{0}` is not implemented")]
    NotImplemented(String),
}

/// Select a delta worker by method name.
///
/// Recognized methods: `fixed_horizon`, `group_sequential`, `bayes_factor`,
/// `bayes_precision`.
pub fn worker_for(method: &str, config: &WorkerConfig) -> Result<Box<dyn DeltaWorker>, StatsError> {
    match method {
        "fixed_horizon" => Ok(Box::new(FixedHorizon::new(config.clone()))),
        "group_sequential" => Ok(Box::new(crate::GroupSequential::new(config.clone()))),
        "bayes_factor" => Ok(Box::new(crate::BayesFactor::new(config.clone()))),
        "bayes_precision" => Ok(Box::new(crate::BayesPrecision::new(config.clone()))),
        other => Err(StatsError::NotImplemented(other.to_string())),
    }
}

/// Number of non-NaN observations in a sample.
pub fn sample_size(values: &[f64]) -> usize {
    values.iter().filter(|v| !v.is_nan()).count()
}

pub(crate) fn drop_nan(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn variance(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64
}

/// Welch standard error of the difference of means.
pub(crate) fn welch_se(xs: &[f64], ys: &[f64]) -> f64 {
    let vx = variance(xs, mean(xs));
    let vy = variance(ys, mean(ys));
    (vx / xs.len() as f64 + vy / ys.len() as f64).sqrt()
}

pub(crate) fn apply_relative(ci: &mut [CiBound], estimate: f64) {
    for bound in ci {
        bound.value -= estimate;
    }
}

/// Fixed-horizon delta worker: difference of means with normal or bootstrap
/// confidence bounds.
#[derive(Debug, Clone)]
pub struct FixedHorizon {
    config: WorkerConfig,
}

impl FixedHorizon {
    /// Create a worker with the given configuration.
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }
}

impl DeltaWorker for FixedHorizon {
    fn compare(&self, x: &[f64], y: &[f64]) -> DeltaStatistics {
        let xs = drop_nan(x);
        let ys = drop_nan(y);
        let (ss_x, ss_y) = (xs.len(), ys.len());

        if ss_x < self.config.min_observations || ss_y < self.config.min_observations {
            return DeltaStatistics::below_threshold(&self.config.percentiles, ss_x, ss_y);
        }

        let mean_x = mean(&xs);
        let mean_y = mean(&ys);
        let estimate = mean_x - mean_y;

        let mut ci = if self.config.assume_normal {
            let se = welch_se(&xs, &ys);
            self.config
                .percentiles
                .iter()
                .map(|&p| CiBound {
                    percentile: p,
                    value: estimate + normal_quantile(p / 100.0) * se,
                })
                .collect::<Vec<_>>()
        } else {
            let diffs = if self.config.parallel {
                bootstrap_diffs_parallel(&xs, &ys, self.config.nruns)
            } else {
                bootstrap_diffs_serial(&xs, &ys, self.config.nruns)
            };
            self.config
                .percentiles
                .iter()
                .map(|&p| CiBound {
                    percentile: p,
                    value: compute_percentile(&diffs, p),
                })
                .collect::<Vec<_>>()
        };

        if self.config.relative {
            apply_relative(&mut ci, estimate);
        }

        DeltaStatistics {
            estimate,
            confidence_interval: ci,
            sample_size_x: ss_x,
            sample_size_y: ss_y,
            mean_x,
            mean_y,
            stop: None,
        }
    }
}

fn resampled_mean_diff(xs: &[f64], ys: &[f64], rng: &mut impl Rng) -> f64 {
    let mx = (0..xs.len())
        .map(|_| xs[rng.gen_range(0..xs.len())])
        .sum::<f64>()
        / xs.len() as f64;
    let my = (0..ys.len())
        .map(|_| ys[rng.gen_range(0..ys.len())])
        .sum::<f64>()
        / ys.len() as f64;
    mx - my
}

/// Bootstrap the difference of means using parallel iteration (Rayon)
fn bootstrap_diffs_parallel(xs: &[f64], ys: &[f64], nruns: usize) -> Vec<f64> {
    (0..nruns)
        .into_par_iter()
        .map_init(thread_rng, |rng, _| resampled_mean_diff(xs, ys, rng))
        .collect()
}

/// Bootstrap the difference of means serially
fn bootstrap_diffs_serial(xs: &[f64], ys: &[f64], nruns: usize) -> Vec<f64> {
    let mut rng = thread_rng();
    (0..nruns)
        .map(|_| resampled_mean_diff(xs, ys, &mut rng))
        .collect()
}
