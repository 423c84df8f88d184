//! Truncated Dirichlet-series approximation used on the critical line.
//!
//! `zeta(s, N) = Σ_{n=1..N} n^(-s) + N^(1-s) / (Re(s) - 1)`
//!
//! This is not a faithful zeta function; downstream thresholds
//! (`NEAR_ZERO_THRESHOLD`, `SEARCH_SUCCESS_THRESHOLD`) are calibrated
//! against exactly this sum and tail term.

use crate::complex::{self, Complex};

/// Terms used by the resonance search metric.
pub const SEARCH_TERMS: u32 = 15;
/// Terms used by the correlation analyzer and per-gate analysis.
pub const ANALYSIS_TERMS: u32 = 30;
/// Terms used by the time-based tuned analysis.
pub const TIMED_TERMS: u32 = 25;
/// Terms used by the Ψ equation.
pub const PSI_TERMS: u32 = 50;

/// Approximate ζ(s) with `terms` series terms and one tail correction.
///
/// `s.re == 1` divides the correction by zero; the resulting infinities or
/// NaNs are returned as-is.
pub fn zeta(s: Complex, terms: u32) -> Complex {
    let neg_s = Complex::new(-s.re, -s.im);
    let mut total = complex::ZERO;
    for n in 1..=terms {
        total = complex::add(total, complex::pow_real_complex(n as f64, neg_s));
    }

    let numerator = complex::pow_real_complex(terms as f64, Complex::new(1.0 - s.re, -s.im));
    let denom = s.re - 1.0;
    let correction = Complex::new(numerator.re / denom, numerator.im / denom);

    complex::add(total, correction)
}

/// A point on the critical line: `0.5 + i·t`.
pub fn critical_point(t: f64) -> Complex {
    Complex::new(0.5, t)
}

/// `|zeta(0.5 + i·t, terms)|`.
pub fn critical_magnitude(t: f64, terms: u32) -> f64 {
    complex::abs(zeta(critical_point(t), terms))
}
