//! Per-call diagnostics.

use std::collections::BTreeMap;

use serde::Serialize;

/// Non-fatal warnings recorded during one analysis call.
///
/// Keyed by operation name (`sga`, `trend`, ...). Travels with the result
/// instead of living in process-global state; each recorded entry is also
/// emitted through `tracing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    warnings: BTreeMap<String, String>,
}

impl Diagnostics {
    /// Record a warning for an operation.
    pub fn warn(&mut self, operation: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(operation, "{}", message);
        self.warnings.insert(operation.to_string(), message);
    }

    /// The warning recorded for an operation, if any.
    pub fn get(&self, operation: &str) -> Option<&str> {
        self.warnings.get(operation).map(String::as_str)
    }

    /// Whether any warning was recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// All recorded warnings.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.warnings
            .iter()
            .map(|(op, msg)| (op.as_str(), msg.as_str()))
    }
}
