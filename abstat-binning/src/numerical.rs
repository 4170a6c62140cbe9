//! Numerical binning with explicit boundaries.

use abstat_stats::compute_percentile;

use crate::{BinLabel, BinningError, LabelFormat};

/// Ordered bins over a numeric column.
///
/// Each bin is an interval with independently closed or open ends. Bins are
/// stored in ascending order; a value is assigned to the first bin that
/// contains it, NaN and out-of-range values get no label.
#[derive(Debug, Clone)]
pub struct NumericalBinning {
    lowers: Vec<f64>,
    uppers: Vec<f64>,
    lo_closed: Vec<bool>,
    up_closed: Vec<bool>,
}

impl NumericalBinning {
    /// Build a binning from explicit boundaries.
    pub fn new(
        lowers: Vec<f64>,
        uppers: Vec<f64>,
        lo_closed: Vec<bool>,
        up_closed: Vec<bool>,
    ) -> Result<Self, BinningError> {
        if lowers.is_empty() {
            return Err(BinningError::EmptyData);
        }
        if lowers.len() != uppers.len()
            || lowers.len() != lo_closed.len()
            || lowers.len() != up_closed.len()
        {
            return Err(BinningError::MismatchedBoundaries);
        }
        Ok(Self {
            lowers,
            uppers,
            lo_closed,
            up_closed,
        })
    }

    /// Equal-frequency binning: edges at evenly spaced percentiles of the
    /// non-NaN values. Duplicate edges collapse, so heavily tied columns may
    /// yield fewer than `n_bins` bins. The first bin is closed on both ends,
    /// later bins are `(lo, hi]`.
    pub fn equal_frequency(values: &[f64], n_bins: usize) -> Result<Self, BinningError> {
        if n_bins == 0 {
            return Err(BinningError::ZeroBins);
        }
        let clean: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if clean.is_empty() {
            return Err(BinningError::EmptyData);
        }

        let mut edges: Vec<f64> = (0..=n_bins)
            .map(|i| compute_percentile(&clean, 100.0 * i as f64 / n_bins as f64))
            .collect();
        edges.dedup();

        if edges.len() < 2 {
            // constant column: one degenerate bin
            let v = edges[0];
            return Self::new(vec![v], vec![v], vec![true], vec![true]);
        }

        let n = edges.len() - 1;
        let lowers = edges[..n].to_vec();
        let uppers = edges[1..].to_vec();
        let mut lo_closed = vec![false; n];
        lo_closed[0] = true;
        let up_closed = vec![true; n];
        Self::new(lowers, uppers, lo_closed, up_closed)
    }

    /// One closed point bin per value, ascending. Used for time-trend bins,
    /// where every distinct time point is its own bin.
    pub fn closed_points(points: &[f64]) -> Result<Self, BinningError> {
        let mut sorted: Vec<f64> = points.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return Err(BinningError::EmptyData);
        }
        sorted.sort_by(f64::total_cmp);
        sorted.dedup();
        let n = sorted.len();
        Self::new(sorted.clone(), sorted, vec![true; n], vec![true; n])
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.lowers.len()
    }

    /// Whether the binning has no bins (never true for a constructed value).
    pub fn is_empty(&self) -> bool {
        self.lowers.is_empty()
    }

    /// Boundaries of bin `i`: (lower, upper, lower closed, upper closed).
    pub fn boundaries(&self, i: usize) -> (f64, f64, bool, bool) {
        (
            self.lowers[i],
            self.uppers[i],
            self.lo_closed[i],
            self.up_closed[i],
        )
    }

    /// Midpoint of bin `i`, the ordering key of its label.
    pub fn midpoint(&self, i: usize) -> f64 {
        (self.lowers[i] + self.uppers[i]) / 2.0
    }

    /// Index of the bin containing `value`, if any.
    pub fn assign(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        (0..self.len()).find(|&i| {
            let above = value > self.lowers[i] || (self.lo_closed[i] && value == self.lowers[i]);
            let below = value < self.uppers[i] || (self.up_closed[i] && value == self.uppers[i]);
            above && below
        })
    }

    /// Label of bin `i` in the requested format.
    pub fn label_of(&self, i: usize, format: LabelFormat) -> BinLabel {
        let text = match format {
            LabelFormat::Standard => {
                let open = if self.lo_closed[i] { '[' } else { '(' };
                let close = if self.up_closed[i] { ']' } else { ')' };
                format!("{}{}, {}{}", open, self.lowers[i], self.uppers[i], close)
            }
            LabelFormat::Mid => format!("{}", self.midpoint(i)),
        };
        BinLabel::Numeric {
            order: self.midpoint(i),
            text,
        }
    }

    /// Label every value; unassignable values map to `None`.
    pub fn label(&self, values: &[f64], format: LabelFormat) -> Vec<Option<BinLabel>> {
        values
            .iter()
            .map(|&v| self.assign(v).map(|i| self.label_of(i, format)))
            .collect()
    }
}
