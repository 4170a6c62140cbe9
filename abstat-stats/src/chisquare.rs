//! Chi-square homogeneity test for categorical samples.
//!
//! Used by pre-treatment feature checks: do two variants draw from the same
//! category distribution?

use serde::Serialize;

use crate::normal::regularized_gamma_p;

/// Result of a chi-square homogeneity test
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChiSquareResult {
    /// Test statistic
    pub statistic: f64,
    /// Right-tail p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub dof: usize,
}

/// Chi-square test of homogeneity between two categorical samples.
///
/// Builds a 2 x k contingency table over the categories observed in either
/// sample (appearance order). An empty sample yields NaN statistics rather
/// than an error; a single shared category has no room to deviate and tests
/// as trivially homogeneous (statistic 0, p = 1).
pub fn chi_square<S: AsRef<str>>(x: &[S], y: &[S]) -> ChiSquareResult {
    let mut categories: Vec<&str> = Vec::new();
    for v in x.iter().chain(y.iter()) {
        let s = v.as_ref();
        if !categories.contains(&s) {
            categories.push(s);
        }
    }

    if x.is_empty() || y.is_empty() {
        return ChiSquareResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            dof: 0,
        };
    }
    if categories.len() < 2 {
        return ChiSquareResult {
            statistic: 0.0,
            p_value: 1.0,
            dof: 0,
        };
    }

    let count = |sample: &[S], cat: &str| sample.iter().filter(|v| v.as_ref() == cat).count() as f64;

    let n_x = x.len() as f64;
    let n_y = y.len() as f64;
    let total = n_x + n_y;

    let mut statistic = 0.0;
    for cat in &categories {
        let col_total = count(x, cat) + count(y, cat);
        for (sample, n_row) in [(x, n_x), (y, n_y)] {
            let expected = col_total * n_row / total;
            if expected > 0.0 {
                let observed = count(sample, cat);
                statistic += (observed - expected).powi(2) / expected;
            }
        }
    }

    let dof = categories.len() - 1;
    let p_value = 1.0 - regularized_gamma_p(dof as f64 / 2.0, statistic / 2.0);

    ChiSquareResult {
        statistic,
        p_value,
        dof,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_distributions() {
        let x = vec!["a", "a", "b", "b", "c", "c"];
        let y = x.clone();
        let res = chi_square(&x, &y);

        assert!((res.statistic - 0.0).abs() < f64::EPSILON);
        assert!((res.p_value - 1.0).abs() < 1e-9);
        assert_eq!(res.dof, 2);
    }

    #[test]
    fn test_disjoint_distributions() {
        let x = vec!["a"; 50];
        let y = vec!["b"; 50];
        let res = chi_square(&x, &y);

        // completely disjoint -> statistic = total sample size
        assert!((res.statistic - 100.0).abs() < 1e-9);
        assert!(res.p_value < 1e-6);
        assert_eq!(res.dof, 1);
    }

    #[test]
    fn test_mild_imbalance_not_significant() {
        let x = vec!["a", "a", "a", "b", "b", "a", "b", "a", "b", "b"];
        let y = vec!["a", "b", "a", "b", "a", "b", "a", "b", "a", "b"];
        let res = chi_square(&x, &y);

        assert!(res.p_value > 0.05);
    }

    #[test]
    fn test_degenerate_inputs() {
        let empty: Vec<&str> = Vec::new();
        assert!(chi_square(&empty, &["a", "b"]).p_value.is_nan());
        // a single shared category has nowhere to deviate
        let res = chi_square(&["a", "a"], &["a"]);
        assert!((res.statistic - 0.0).abs() < f64::EPSILON);
        assert!((res.p_value - 1.0).abs() < f64::EPSILON);
    }
}
