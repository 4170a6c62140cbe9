#![warn(missing_docs)]
//! Bin assigners for subgroup and trend analysis.
//!
//! A binning maps a column of raw values to bin labels. Numerical binnings
//! carry explicit boundaries (lower/upper, closed flags) and produce labels
//! ordered by bin midpoint, which is what makes cumulative "everything up to
//! this bin" selection possible. Categorical binnings are unordered and
//! cannot be used cumulatively.

mod categorical;
mod numerical;

pub use categorical::CategoricalBinning;
pub use numerical::NumericalBinning;

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use thiserror::Error;

/// Errors from binning construction or application
#[derive(Debug, Clone, Error)]
pub enum BinningError {
    #[error("cannot create a binning from an empty column")]
    EmptyData,

    #[error("bin count must be at least 1")]
    ZeroBins,

    #[error("boundary vectors have mismatched lengths")]
    MismatchedBoundaries,

    #[error("binning type does not match the column type")]
    TypeMismatch,
}

/// How a numerical bin renders its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelFormat {
    /// Interval notation, e.g. `[1.0, 2.5)`
    #[default]
    Standard,
    /// The bin midpoint, e.g. `1.75`
    Mid,
}

/// A bin label attached to a record.
///
/// Numeric labels carry their ordering key (the bin midpoint) so cumulative
/// selection can compare labels; category labels only compare by text.
#[derive(Debug, Clone)]
pub enum BinLabel {
    /// No binning applied (plain delta rows)
    Unbinned,
    /// Ordered label from a numerical binning
    Numeric {
        /// Ordering key: the bin midpoint
        order: f64,
        /// Rendered label text
        text: String,
    },
    /// Unordered label from a categorical binning
    Category(String),
}

impl BinLabel {
    /// Label text as shown in assembled tables (`-` for unbinned).
    pub fn text(&self) -> &str {
        match self {
            BinLabel::Unbinned => "-",
            BinLabel::Numeric { text, .. } => text,
            BinLabel::Category(text) => text,
        }
    }

    /// Whether this label carries an ordering key.
    pub fn is_numeric(&self) -> bool {
        matches!(self, BinLabel::Numeric { .. })
    }
}

impl PartialEq for BinLabel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BinLabel {}

impl PartialOrd for BinLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BinLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        use BinLabel::*;
        match (self, other) {
            (Unbinned, Unbinned) => Ordering::Equal,
            (Unbinned, _) => Ordering::Less,
            (_, Unbinned) => Ordering::Greater,
            (Numeric { order: a, text: ta }, Numeric { order: b, text: tb }) => {
                a.total_cmp(b).then_with(|| ta.cmp(tb))
            }
            (Numeric { .. }, Category(_)) => Ordering::Less,
            (Category(_), Numeric { .. }) => Ordering::Greater,
            (Category(a), Category(b)) => a.cmp(b),
        }
    }
}

impl std::fmt::Display for BinLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text())
    }
}

impl Serialize for BinLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A bin assigner: numerical or categorical.
#[derive(Debug, Clone)]
pub enum Binning {
    /// Ordered bins over a numeric column
    Numerical(NumericalBinning),
    /// Unordered bins over a text column
    Categorical(CategoricalBinning),
}

impl Binning {
    /// Whether labels produced by this binning are orderable.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Binning::Numerical(_))
    }

    /// Label a numeric column. Errors when the binning is categorical.
    pub fn label_numeric(
        &self,
        values: &[f64],
        format: LabelFormat,
    ) -> Result<Vec<Option<BinLabel>>, BinningError> {
        match self {
            Binning::Numerical(b) => Ok(b.label(values, format)),
            Binning::Categorical(_) => Err(BinningError::TypeMismatch),
        }
    }

    /// Label a text column. Errors when the binning is numerical.
    pub fn label_text(&self, values: &[String]) -> Result<Vec<Option<BinLabel>>, BinningError> {
        match self {
            Binning::Numerical(_) => Err(BinningError::TypeMismatch),
            Binning::Categorical(b) => Ok(b.label(values)),
        }
    }
}
