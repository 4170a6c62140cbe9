#![warn(missing_docs)]
//! Result assembly for delta analyses.
//!
//! Every analysis mode (plain delta, subgroup, time trend) lands in the
//! same long-format structure: a table addressed by the canonical 7-part key
//! `(variant, bin, metric, subgroup_metric, subgroup, statistic, percentile)`.
//! Keys are unique, the table is sorted once by key order, and the meaning of
//! the bin component is carried as a level name (`bin`, `subgroup` or
//! `time`). Non-fatal warnings travel with each result in a `Diagnostics`
//! map instead of process-global state.

mod diagnostics;
mod json;
mod key;
mod report;
mod table;

pub use diagnostics::Diagnostics;
pub use json::to_json;
pub use key::{DeltaKey, NO_LEVEL, Statistic};
pub use report::{AnalysisReport, ReportMeta};
pub use table::{DeltaTable, statistic_rows};
