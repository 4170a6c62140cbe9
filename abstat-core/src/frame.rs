//! Column-oriented data frame.
//!
//! The minimal tabular snapshot an experiment is built from: named columns of
//! equal length, numeric (NaN = missing) or text. The frame is moved into the
//! `Experiment` at construction and never mutated afterwards except for the
//! derived columns added during construction itself.

use fxhash::FxHashMap;
use thiserror::Error;

/// Errors from frame construction
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    #[error("column `{column}` has length {got}, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    #[error("column `{0}` already exists")]
    DuplicateColumn(String),

    #[error("column `{0}` cannot be coerced to numeric")]
    NotNumeric(String),
}

/// One column of data
#[derive(Debug, Clone)]
pub enum Column {
    /// Floating-point values; NaN marks a missing observation
    Numeric(Vec<f64>),
    /// Text labels (variants, categories, identifiers)
    Text(Vec<String>),
}

impl Column {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(v) => v.len(),
            Column::Text(v) => v.len(),
        }
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds numeric values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Numeric view, if this is a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(v) => Some(v),
            Column::Text(_) => None,
        }
    }

    /// Text view, if this is a text column.
    pub fn as_text(&self) -> Option<&[String]> {
        match self {
            Column::Text(v) => Some(v),
            Column::Numeric(_) => None,
        }
    }

    /// Coerce to floating point, parsing text values.
    pub fn to_numeric(&self, name: &str) -> Result<Vec<f64>, FrameError> {
        match self {
            Column::Numeric(v) => Ok(v.clone()),
            Column::Text(v) => v
                .iter()
                .map(|s| {
                    s.parse::<f64>()
                        .map_err(|_| FrameError::NotNumeric(name.to_string()))
                })
                .collect(),
        }
    }
}

/// Named columns of equal length
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    names: Vec<String>,
    columns: FxHashMap<String, Column>,
}

impl DataFrame {
    /// New empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from (name, column) pairs.
    pub fn from_columns(
        columns: impl IntoIterator<Item = (String, Column)>,
    ) -> Result<Self, FrameError> {
        let mut frame = Self::new();
        for (name, column) in columns {
            frame.insert_column(name, column)?;
        }
        Ok(frame)
    }

    /// Add a column; the name must be new and the length must match.
    pub fn insert_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), FrameError> {
        let name = name.into();
        if self.columns.contains_key(&name) {
            return Err(FrameError::DuplicateColumn(name));
        }
        if let Some(expected) = self.names.first().map(|n| self.columns[n].len()) {
            if column.len() != expected {
                return Err(FrameError::LengthMismatch {
                    column: name,
                    expected,
                    got: column.len(),
                });
            }
        }
        self.names.push(name.clone());
        self.columns.insert(name, column);
        Ok(())
    }

    /// Add or replace a column (derived KPIs overwrite an existing name).
    pub(crate) fn set_column(&mut self, name: &str, column: Column) -> Result<(), FrameError> {
        if let Some(expected) = self.names.first().map(|n| self.columns[n].len()) {
            if column.len() != expected {
                return Err(FrameError::LengthMismatch {
                    column: name.to_string(),
                    expected,
                    got: column.len(),
                });
            }
        }
        if !self.columns.contains_key(name) {
            self.names.push(name.to_string());
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Whether a column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Number of rows (0 for a frame with no columns).
    pub fn nrows(&self) -> usize {
        self.names
            .first()
            .map(|n| self.columns[n].len())
            .unwrap_or(0)
    }

    /// Whether the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.nrows() == 0
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Names of the numeric columns, in insertion order.
    pub fn numeric_column_names(&self) -> Vec<String> {
        self.names
            .iter()
            .filter(|n| self.columns[*n].is_numeric())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut frame = DataFrame::new();
        frame
            .insert_column("orders", Column::Numeric(vec![1.0, 2.0]))
            .unwrap();
        frame
            .insert_column(
                "variant",
                Column::Text(vec!["A".to_string(), "B".to_string()]),
            )
            .unwrap();

        assert_eq!(frame.nrows(), 2);
        assert!(frame.contains("orders"));
        assert_eq!(frame.numeric_column_names(), vec!["orders"]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut frame = DataFrame::new();
        frame
            .insert_column("a", Column::Numeric(vec![1.0, 2.0]))
            .unwrap();
        let err = frame
            .insert_column("b", Column::Numeric(vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, FrameError::LengthMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut frame = DataFrame::new();
        frame.insert_column("a", Column::Numeric(vec![])).unwrap();
        assert!(matches!(
            frame.insert_column("a", Column::Numeric(vec![])),
            Err(FrameError::DuplicateColumn(_))
        ));
    }

    #[test]
    fn test_text_coercion() {
        let col = Column::Text(vec!["1.5".to_string(), "2".to_string()]);
        assert_eq!(col.to_numeric("c").unwrap(), vec![1.5, 2.0]);

        let bad = Column::Text(vec!["abc".to_string()]);
        assert!(matches!(bad.to_numeric("c"), Err(FrameError::NotNumeric(_))));
    }
}
