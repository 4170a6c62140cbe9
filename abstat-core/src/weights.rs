//! Per-row weights for ratio KPIs.
//!
//! A ratio KPI (one derived as `numerator/denominator`) is normalized before
//! comparison: each row is scaled by its share of the reference KPI's total
//! mass, and cohorts heavy in zero or missing reference values are
//! down-weighted. KPIs without a reference weigh 1.0.

/// Weight vector for one (KPI, variant) sample
#[derive(Debug, Clone, PartialEq)]
pub enum Weights {
    /// No reference KPI: every row weighs 1.0
    Unit,
    /// One weight per row, aligned to the variant's rows
    PerRow(Vec<f64>),
}

impl Weights {
    /// Scale a sample element-wise.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        match self {
            Weights::Unit => values.to_vec(),
            Weights::PerRow(w) => values.iter().zip(w.iter()).map(|(v, w)| v * w).collect(),
        }
    }
}

/// Weight vector from reference-KPI values:
/// `(count(x != 0 and not missing) / nansum(x)) * x`.
///
/// A zero reference sum yields non-finite weights; that is propagated, not
/// special-cased, and the delta worker treats the result as a degenerate
/// sample.
pub(crate) fn per_row(reference: &[f64]) -> Vec<f64> {
    let zeros_and_nans = reference
        .iter()
        .filter(|v| **v == 0.0 || v.is_nan())
        .count();
    let non_zeros = (reference.len() - zeros_and_nans) as f64;
    let total: f64 = reference.iter().filter(|v| !v.is_nan()).sum();
    let factor = non_zeros / total;
    reference.iter().map(|x| factor * x).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_scale_by_reference_share() {
        // two equal non-zero rows split the mass evenly
        let w = per_row(&[2.0, 2.0]);
        assert_eq!(w, vec![1.0, 1.0]);

        // uneven rows: factor = 2 / 6, weights proportional to x
        let w = per_row(&[2.0, 4.0]);
        assert!((w[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((w[1] - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_zeros_and_missing_reduce_the_numerator() {
        let w = per_row(&[2.0, 0.0, f64::NAN, 2.0]);
        // 2 non-zero rows over a nansum of 4
        assert!((w[0] - 1.0).abs() < 1e-12);
        assert!((w[1] - 0.0).abs() < 1e-12);
        assert!(w[2].is_nan());
        assert!((w[3] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_sum_reference_goes_non_finite() {
        let w = per_row(&[0.0, 0.0]);
        assert!(w.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_unit_apply_is_identity() {
        let values = vec![1.0, 2.0, 3.0];
        assert_eq!(Weights::Unit.apply(&values), values);
    }
}
