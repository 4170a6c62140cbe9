//! Distribution primitives.
//!
//! Hand-rolled approximations sufficient for confidence-bound work; no
//! dependency on a full special-functions crate.

/// Error function approximation (Abramowitz and Stegun 7.1.26).
///
/// Maximum absolute error about 1.5e-7.
pub fn erf(x: f64) -> f64 {
    let a1 = 0.254829592;
    let a2 = -0.284496736;
    let a3 = 1.421413741;
    let a4 = -1.453152027;
    let a5 = 1.061405429;
    let p = 0.3275911;

    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + p * x);
    let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

    sign * y
}

/// Standard normal CDF.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Normal density at `x` for the given mean and standard deviation.
pub fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    if sd <= 0.0 {
        return f64::NAN;
    }
    let z = (x - mean) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * std::f64::consts::PI).sqrt())
}

/// Standard normal quantile (inverse CDF).
///
/// Rational approximation, Abramowitz and Stegun 26.2.23.
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let p = p.clamp(1e-10, 1.0 - 1e-10);

    let sign = if p < 0.5 { -1.0 } else { 1.0 };
    let p = if p < 0.5 { p } else { 1.0 - p };

    let t = (-2.0 * p.ln()).sqrt();

    let c0 = 2.515517;
    let c1 = 0.802853;
    let c2 = 0.010328;
    let d1 = 1.432788;
    let d2 = 0.189269;
    let d3 = 0.001308;

    let x = t - (c0 + c1 * t + c2 * t * t) / (1.0 + d1 * t + d2 * t * t + d3 * t * t * t);

    sign * x
}

/// Natural log of the gamma function (Lanczos approximation).
fn ln_gamma(x: f64) -> f64 {
    // g = 7, n = 9 coefficients
    const COEFFS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // reflection formula
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = COEFFS[0];
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

/// Regularized lower incomplete gamma P(a, x).
///
/// Series expansion for `x < a + 1`, continued fraction otherwise. Backs the
/// chi-square CDF: `chi2_cdf(x, k) = P(k/2, x/2)`.
pub fn regularized_gamma_p(a: f64, x: f64) -> f64 {
    if a <= 0.0 || x < 0.0 {
        return f64::NAN;
    }
    if x == 0.0 {
        return 0.0;
    }

    const MAX_ITER: usize = 200;
    const EPS: f64 = 1e-12;

    if x < a + 1.0 {
        // series: P(a,x) = e^{-x} x^a / Gamma(a) * sum x^n / (a (a+1) ... (a+n))
        let mut ap = a;
        let mut sum = 1.0 / a;
        let mut term = sum;
        for _ in 0..MAX_ITER {
            ap += 1.0;
            term *= x / ap;
            sum += term;
            if term.abs() < sum.abs() * EPS {
                break;
            }
        }
        sum * (-x + a * x.ln() - ln_gamma(a)).exp()
    } else {
        // continued fraction for Q(a,x), modified Lentz
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / 1e-300;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=MAX_ITER {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < 1e-300 {
                d = 1e-300;
            }
            c = b + an / c;
            if c.abs() < 1e-300 {
                c = 1e-300;
            }
            d = 1.0 / d;
            let del = d * c;
            h *= del;
            if (del - 1.0).abs() < EPS {
                break;
            }
        }
        let q = (-x + a * x.ln() - ln_gamma(a)).exp() * h;
        1.0 - q
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_quantile_known_values() {
        assert!((normal_quantile(0.5) - 0.0).abs() < 0.01);
        assert!((normal_quantile(0.975) - 1.96).abs() < 0.01);
        assert!((normal_quantile(0.025) + 1.96).abs() < 0.01);
    }

    #[test]
    fn test_normal_cdf_known_values() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 0.01);
        assert!((normal_cdf(1.96) - 0.975).abs() < 0.01);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 0.01);
    }

    #[test]
    fn test_normal_pdf_peak() {
        // standard normal density at the mean
        assert!((normal_pdf(0.0, 0.0, 1.0) - 0.3989).abs() < 1e-3);
        // scales with sd
        assert!((normal_pdf(0.0, 0.0, 2.0) - 0.1995).abs() < 1e-3);
    }

    #[test]
    fn test_gamma_p_chi_square_cdf() {
        // chi2 with 1 dof at x = 3.841 -> CDF = 0.95
        let p = regularized_gamma_p(0.5, 3.841 / 2.0);
        assert!((p - 0.95).abs() < 1e-3);
        // chi2 with 2 dof at x = 5.991 -> CDF = 0.95
        let p = regularized_gamma_p(1.0, 5.991 / 2.0);
        assert!((p - 0.95).abs() < 1e-3);
    }

    #[test]
    fn test_gamma_p_bounds() {
        assert!((regularized_gamma_p(1.0, 0.0) - 0.0).abs() < f64::EPSILON);
        assert!(regularized_gamma_p(1.0, 1e6) > 0.999_999);
        assert!(regularized_gamma_p(-1.0, 1.0).is_nan());
    }
}
