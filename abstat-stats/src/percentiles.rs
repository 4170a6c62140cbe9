//! Percentile computation.
//!
//! Linear interpolation between nearest ranks; also the workhorse behind
//! equal-frequency bin edges and bootstrap percentile intervals.

/// Compute a single percentile (0-100) from samples.
///
/// Returns 0.0 for an empty slice. Callers pass NaN-free data.
pub fn compute_percentile(samples: &[f64], percentile: f64) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    if samples.len() == 1 {
        return samples[0];
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len();
    let rank = (percentile / 100.0) * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = (lower_idx + 1).min(n - 1);
    let fraction = rank - lower_idx as f64;

    sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_of_odd_run() {
        let samples = vec![5.0, 1.0, 3.0, 2.0, 4.0];
        assert!((compute_percentile(&samples, 50.0) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_extremes() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        assert!((compute_percentile(&samples, 0.0) - 1.0).abs() < 1e-9);
        assert!((compute_percentile(&samples, 100.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation() {
        let samples = vec![10.0, 20.0];
        assert!((compute_percentile(&samples, 25.0) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_and_empty() {
        assert!((compute_percentile(&[42.0], 90.0) - 42.0).abs() < f64::EPSILON);
        assert!((compute_percentile(&[], 50.0) - 0.0).abs() < f64::EPSILON);
    }
}
