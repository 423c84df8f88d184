//! Complex primitives used by the approximator and the Ψ equation.
//!
//! All functions are total over IEEE754 doubles. They are written out
//! component-wise so results stay bit-identical across platforms with the
//! same libm.

pub use num_complex::Complex64 as Complex;

/// The additive identity.
pub const ZERO: Complex = Complex::new(0.0, 0.0);

pub fn add(a: Complex, b: Complex) -> Complex {
    Complex::new(a.re + b.re, a.im + b.im)
}

pub fn mul(a: Complex, b: Complex) -> Complex {
    Complex::new(a.re * b.re - a.im * b.im, a.re * b.im + a.im * b.re)
}

/// Multiply both components by a real scalar.
pub fn scale(c: Complex, k: f64) -> Complex {
    Complex::new(c.re * k, c.im * k)
}

/// Modulus `sqrt(re² + im²)`.
///
/// Computed directly rather than through `hypot` so that overflow and
/// rounding behave exactly like the reference formula.
pub fn abs(c: Complex) -> f64 {
    (c.re * c.re + c.im * c.im).sqrt()
}

pub fn phase(c: Complex) -> f64 {
    c.im.atan2(c.re)
}

/// `e^(ix) = cos x + i sin x`.
pub fn exp_i(x: f64) -> Complex {
    Complex::new(x.cos(), x.sin())
}

/// `base^exponent` for a real base and complex exponent.
///
/// Returns zero when `base <= 0`. That is a defined result, not a fault:
/// callers that must tell "degenerate" from "computed zero" check the
/// base themselves.
pub fn pow_real_complex(base: f64, exponent: Complex) -> Complex {
    if base <= 0.0 {
        return ZERO;
    }
    let ln_base = base.ln();
    let magnitude = base.powf(exponent.re);
    let angle = exponent.im * ln_base;
    Complex::new(magnitude * angle.cos(), magnitude * angle.sin())
}
