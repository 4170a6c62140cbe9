//! Report data structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diagnostics::Diagnostics;
use crate::table::DeltaTable;

/// Metadata attached to an assembled report
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    /// When the report was assembled
    pub timestamp: DateTime<Utc>,
    /// Control variant the deltas are measured against
    pub control_variant: String,
    /// All variants discovered in the data
    pub variants: Vec<String>,
    /// Caller-supplied experiment metadata
    pub metadata: BTreeMap<String, String>,
}

/// One analysis result packaged for export: metadata, the assembled table,
/// and any warnings recorded along the way.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    /// Report metadata
    pub meta: ReportMeta,
    /// The assembled long-format table
    pub table: DeltaTable,
    /// Warnings recorded during the analysis
    pub warnings: Diagnostics,
}

impl AnalysisReport {
    /// Package a table with metadata, stamped now.
    pub fn new(
        control_variant: &str,
        variants: &[String],
        metadata: BTreeMap<String, String>,
        table: DeltaTable,
        warnings: Diagnostics,
    ) -> Self {
        Self {
            meta: ReportMeta {
                timestamp: Utc::now(),
                control_variant: control_variant.to_string(),
                variants: variants.to_vec(),
                metadata,
            },
            table,
            warnings,
        }
    }
}
