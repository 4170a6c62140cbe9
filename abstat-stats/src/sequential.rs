//! Early-stopping delta workers.
//!
//! Sequential and Bayesian variants of the two-sample comparison. Each
//! returns the same `DeltaStatistics` as the fixed-horizon worker plus a
//! `stop` decision: whether the experiment has collected enough evidence to
//! end early.

use crate::delta::{
    CiBound, DeltaStatistics, DeltaWorker, WorkerConfig, apply_relative, drop_nan, mean, variance,
    welch_se,
};
use crate::normal::{normal_cdf, normal_pdf, normal_quantile};

/// Group-sequential worker with O'Brien-Fleming alpha spending.
///
/// At information fraction `f` the nominal significance level is tightened to
/// `2 - 2 * Phi(z_{1-alpha/2} / sqrt(f))`, so early looks need overwhelming
/// evidence while the final look spends the full alpha. The adjusted
/// z-boundary is capped at `config.cap`.
#[derive(Debug, Clone)]
pub struct GroupSequential {
    config: WorkerConfig,
}

impl GroupSequential {
    /// Create a worker with the given configuration.
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    fn adjusted_alpha(&self) -> f64 {
        let frac = self.config.information_fraction.clamp(1e-6, 1.0);
        if frac < 1.0 {
            let z = normal_quantile(1.0 - self.config.alpha / 2.0);
            2.0 - 2.0 * normal_cdf(z / frac.sqrt())
        } else {
            self.config.alpha
        }
    }
}

impl DeltaWorker for GroupSequential {
    fn compare(&self, x: &[f64], y: &[f64]) -> DeltaStatistics {
        let xs = drop_nan(x);
        let ys = drop_nan(y);
        let (ss_x, ss_y) = (xs.len(), ys.len());

        let alpha_new = self.adjusted_alpha();
        // bounds are reported at the spending-adjusted percentiles
        let percentiles = [50.0 * alpha_new, 100.0 - 50.0 * alpha_new];

        if ss_x < self.config.min_observations || ss_y < self.config.min_observations {
            return DeltaStatistics::below_threshold(&percentiles, ss_x, ss_y);
        }

        let mean_x = mean(&xs);
        let mean_y = mean(&ys);
        let estimate = mean_x - mean_y;
        let se = welch_se(&xs, &ys);

        let z_crit = normal_quantile(1.0 - alpha_new / 2.0).min(self.config.cap);
        let z_stat = estimate / se;
        let stop = z_stat.abs() > z_crit;

        let mut ci: Vec<CiBound> = percentiles
            .iter()
            .map(|&p| CiBound {
                percentile: p,
                value: estimate + normal_quantile(p / 100.0) * se,
            })
            .collect();
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
            stop: Some(stop),
        }
    }
}

/// Normal-posterior summary shared by the Bayesian workers.
struct Posterior {
    ss_x: usize,
    ss_y: usize,
    mean_x: f64,
    mean_y: f64,
    estimate: f64,
    se: f64,
    pooled_sd: f64,
}

fn posterior(xs: &[f64], ys: &[f64]) -> Posterior {
    let mean_x = mean(xs);
    let mean_y = mean(ys);
    let vx = variance(xs, mean_x);
    let vy = variance(ys, mean_y);
    Posterior {
        ss_x: xs.len(),
        ss_y: ys.len(),
        mean_x,
        mean_y,
        estimate: mean_x - mean_y,
        se: welch_se(xs, ys),
        pooled_sd: ((vx + vy) / 2.0).sqrt(),
    }
}

fn credible_interval(p: &Posterior, percentiles: &[f64]) -> Vec<CiBound> {
    percentiles
        .iter()
        .map(|&pct| CiBound {
            percentile: pct,
            value: p.estimate + normal_quantile(pct / 100.0) * p.se,
        })
        .collect()
}

/// Bayes-factor worker.
///
/// Savage-Dickey rendition with a zero-centered normal prior on the mean
/// difference whose width is `prior_scale` pooled standard deviations. The
/// evidence ratio `BF01 = posterior(0) / prior(0)` stops the experiment once
/// it passes 3 in either direction.
#[derive(Debug, Clone)]
pub struct BayesFactor {
    config: WorkerConfig,
}

impl BayesFactor {
    /// Create a worker with the given configuration.
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }
}

impl DeltaWorker for BayesFactor {
    fn compare(&self, x: &[f64], y: &[f64]) -> DeltaStatistics {
        let xs = drop_nan(x);
        let ys = drop_nan(y);
        let (ss_x, ss_y) = (xs.len(), ys.len());

        if ss_x < self.config.min_observations || ss_y < self.config.min_observations {
            return DeltaStatistics::below_threshold(&self.config.percentiles, ss_x, ss_y);
        }

        let post = posterior(&xs, &ys);
        let tau = self.config.prior_scale * post.pooled_sd;
        let bf01 = normal_pdf(0.0, post.estimate, post.se) / normal_pdf(0.0, 0.0, tau);
        let stop = bf01 > 3.0 || bf01 < 1.0 / 3.0;

        let mut ci = credible_interval(&post, &self.config.percentiles);
        if self.config.relative {
            apply_relative(&mut ci, post.estimate);
        }

        DeltaStatistics {
            estimate: post.estimate,
            confidence_interval: ci,
            sample_size_x: ss_x,
            sample_size_y: ss_y,
            mean_x: post.mean_x,
            mean_y: post.mean_y,
            stop: Some(stop),
        }
    }
}

/// Bayes-precision worker.
///
/// Stops once the posterior credible interval is narrow enough to act on:
/// width below `precision * |control mean|`.
#[derive(Debug, Clone)]
pub struct BayesPrecision {
    config: WorkerConfig,
}

impl BayesPrecision {
    /// Create a worker with the given configuration.
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }
}

impl DeltaWorker for BayesPrecision {
    fn compare(&self, x: &[f64], y: &[f64]) -> DeltaStatistics {
        let xs = drop_nan(x);
        let ys = drop_nan(y);
        let (ss_x, ss_y) = (xs.len(), ys.len());

        if ss_x < self.config.min_observations || ss_y < self.config.min_observations {
            return DeltaStatistics::below_threshold(&self.config.percentiles, ss_x, ss_y);
        }

        let post = posterior(&xs, &ys);
        let ci = credible_interval(&post, &self.config.percentiles);
        let width = ci
            .iter()
            .map(|b| b.value)
            .fold(f64::NEG_INFINITY, f64::max)
            - ci.iter().map(|b| b.value).fold(f64::INFINITY, f64::min);
        let stop = width < self.config.precision * post.mean_y.abs();

        let mut ci = ci;
        if self.config.relative {
            apply_relative(&mut ci, post.estimate);
        }

        DeltaStatistics {
            estimate: post.estimate,
            confidence_interval: ci,
            sample_size_x: ss_x,
            sample_size_y: ss_y,
            mean_x: post.mean_x,
            mean_y: post.mean_y,
            stop: Some(stop),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spread(base: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| base + (i % 10) as f64 * 0.1).collect()
    }

    #[test]
    fn test_group_sequential_stops_on_large_effect() {
        let control = spread(100.0, 100);
        let treatment = spread(110.0, 100);
        let ds = GroupSequential::new(WorkerConfig::default()).compare(&treatment, &control);

        assert_eq!(ds.stop, Some(true));
        assert!((ds.estimate - 10.0).abs() < 0.5);
    }

    #[test]
    fn test_group_sequential_no_stop_without_effect() {
        let samples = spread(100.0, 100);
        let ds = GroupSequential::new(WorkerConfig::default()).compare(&samples, &samples);

        assert_eq!(ds.stop, Some(false));
        assert!((ds.estimate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_early_look_needs_more_evidence() {
        // a modest effect that clears the full-alpha boundary but not the
        // O'Brien-Fleming boundary at 20% information
        let control = spread(100.0, 60);
        let treatment: Vec<f64> = spread(100.0, 60).iter().map(|v| v + 0.15).collect();

        let full = GroupSequential::new(WorkerConfig::default()).compare(&treatment, &control);
        let early = GroupSequential::new(WorkerConfig {
            information_fraction: 0.2,
            ..Default::default()
        })
        .compare(&treatment, &control);

        assert_eq!(full.stop, Some(true));
        assert_eq!(early.stop, Some(false));
    }

    #[test]
    fn test_bayes_factor_supports_null_on_identical_data() {
        let samples = spread(50.0, 200);
        let ds = BayesFactor::new(WorkerConfig::default()).compare(&samples, &samples);

        // zero observed difference with a tight posterior is strong evidence
        // for the null, which is also a stopping condition
        assert_eq!(ds.stop, Some(true));
        assert!((ds.estimate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bayes_precision_stops_when_narrow() {
        let control = spread(100.0, 500);
        let treatment = spread(100.5, 500);
        let ds = BayesPrecision::new(WorkerConfig::default()).compare(&treatment, &control);

        // half a percent of sampling noise on 500 observations is plenty
        assert_eq!(ds.stop, Some(true));
    }

    #[test]
    fn test_bayes_precision_keeps_running_when_wide() {
        let control = spread(1.0, 25);
        let treatment = spread(1.1, 25);
        let cfg = WorkerConfig {
            precision: 0.001,
            ..Default::default()
        };
        let ds = BayesPrecision::new(cfg).compare(&treatment, &control);

        assert_eq!(ds.stop, Some(false));
    }

    #[test]
    fn test_below_threshold_has_no_decision() {
        let ds = GroupSequential::new(WorkerConfig::default()).compare(&[1.0], &[2.0]);
        assert!(ds.estimate.is_nan());
        assert_eq!(ds.stop, None);
    }
}
