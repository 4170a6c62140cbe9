#![warn(missing_docs)]
//! # abstat
//!
//! Statistical A/B experiment analysis for Rust:
//! - **Delta estimates**: every KPI, every variant against a designated
//!   control, with confidence bounds from a normal approximation or
//!   bootstrap resampling
//! - **Derived KPIs**: ratio metrics declared as arithmetic formulas and
//!   normalized with per-row reference weights
//! - **Subgroup analysis**: equal-frequency or categorical bins over any
//!   feature column, one independent comparison per bin
//! - **Time trends**: per-time-point comparisons, cumulative by default
//! - **Early stopping**: group-sequential and Bayesian delta workers
//! - **One result shape**: everything lands in a long-format table keyed by
//!   `(variant, bin, metric, subgroup_metric, subgroup, statistic,
//!   percentile)`, with warnings carried per call
//!
//! ## Quick Start
//!
//! ```ignore
//! use abstat::prelude::*;
//!
//! let experiment = Experiment::new("control", frame, metadata, None, vec![])?;
//! let result = experiment.delta("fixed_horizon", &WorkerConfig::default())?;
//! let table = result.to_table();
//! ```

// Re-export the data model and orchestration
pub use abstat_core::{
    Column, DEFAULT_BINS, DataFrame, DeltaResult, DerivedKpi, ENTITY_COLUMN, Experiment,
    ExperimentError, FeatureCheckAnalysis, FeatureCheckOptions, FrameError, SgaAnalysis,
    SgaOptions, TIME_COLUMN, TrendAnalysis, TrendOptions, VARIANT_COLUMN, VariantComparison,
    Weights,
};

// Re-export the statistical workers
pub use abstat_stats::{
    BayesFactor, BayesPrecision, ChiSquareResult, CiBound, DeltaStatistics, DeltaWorker,
    FixedHorizon, GroupSequential, StatsError, WorkerConfig, chi_square, compute_percentile,
    sample_size, worker_for,
};

// Re-export binning
pub use abstat_binning::{
    BinLabel, Binning, BinningError, CategoricalBinning, LabelFormat, NumericalBinning,
};

// Re-export result assembly
pub use abstat_report::{
    AnalysisReport, DeltaKey, DeltaTable, Diagnostics, NO_LEVEL, ReportMeta, Statistic, to_json,
};

// Re-export formula logic
pub use abstat_logic::{Expr, FormulaError, parse_formula};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Column, DataFrame, DeltaKey, DeltaTable, DerivedKpi, Experiment, FeatureCheckOptions,
        SgaOptions, Statistic, TrendOptions, WorkerConfig,
    };
}
