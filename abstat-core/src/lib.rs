#![warn(missing_docs)]
//! abstat Core: Experiment Dataset and Delta Aggregation
//!
//! This crate owns the data model and the orchestration:
//! - `DataFrame`/`Column`: the validated, immutable tabular snapshot
//! - `Experiment`: construction with derived-KPI evaluation, weight
//!   resolution for ratio KPIs, and the three public analysis modes
//!   (`delta`, `sga`, `trend`) plus pre-treatment `feature_check`
//! - the shared binned-delta engine behind the subgroup and trend modes
//!
//! Statistical workers come from `abstat-stats`, bin assigners from
//! `abstat-binning`, and results land in `abstat-report` tables.

mod analysis;
mod engine;
mod experiment;
mod frame;
mod weights;

pub use analysis::{
    DEFAULT_BINS, FeatureCheckAnalysis, FeatureCheckOptions, SgaAnalysis, SgaOptions,
    TrendAnalysis, TrendOptions,
};
pub use experiment::{
    DeltaResult, DerivedKpi, ENTITY_COLUMN, Experiment, ExperimentError, TIME_COLUMN,
    VARIANT_COLUMN, VariantComparison,
};
pub use frame::{Column, DataFrame, FrameError};
pub use weights::Weights;
