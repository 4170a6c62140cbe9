#![warn(missing_docs)]
//! abstat Statistical Engine
//!
//! Two-sample delta workers and the numeric primitives behind them:
//! - Normal-approximation (Welch) confidence intervals for the difference of means
//! - Bootstrap resampling of the difference, parallel with a serial fallback
//! - Group-sequential early stopping with O'Brien-Fleming alpha spending
//! - Bayes-factor and posterior-precision stopping rules
//! - Chi-square homogeneity test for categorical columns
//! - Percentile computation via linear interpolation
//!
//! Every worker shares one contract: NaN observations are ignored for counts
//! and means, and when either sample falls below the configured
//! `min_observations` the float outputs are all NaN instead of an error.

mod chisquare;
mod delta;
mod normal;
mod percentiles;
mod sequential;

pub use chisquare::{ChiSquareResult, chi_square};
pub use delta::{
    CiBound, DeltaStatistics, DeltaWorker, FixedHorizon, StatsError, WorkerConfig, sample_size,
    worker_for,
};
pub use normal::{erf, normal_cdf, normal_pdf, normal_quantile, regularized_gamma_p};
pub use percentiles::compute_percentile;
pub use sequential::{BayesFactor, BayesPrecision, GroupSequential};

/// Default confidence-bound percentiles (a central 95% interval)
pub const DEFAULT_PERCENTILES: [f64; 2] = [2.5, 97.5];

/// Default minimum per-sample observation count below which results are NaN
pub const DEFAULT_MIN_OBSERVATIONS: usize = 20;

/// Default number of bootstrap resampling runs
pub const DEFAULT_NRUNS: usize = 10_000;
