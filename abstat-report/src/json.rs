//! JSON export.

use crate::report::AnalysisReport;

/// Serialize a report to pretty-printed JSON.
pub fn to_json(report: &AnalysisReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
