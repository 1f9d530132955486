//! Small numerically-stable math utilities used across probability code.
//!
//! The `f64` functions are the primal kernels; the `*_s` variants lift them
//! into any [`Scalar`] so derivatives flow through them in AD types.

use jsu_ad::Scalar;
use jsu_core::DType;
use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};

/// Natural log of `sqrt(2π)`.
///
/// `ln(sqrt(2π)) = 0.5*ln(2π)`.
pub const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Standard-normal density `φ(x)`.
#[inline]
pub fn normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x - LN_SQRT_2PI).exp()
}

/// Standard-normal CDF `Φ(x) = 0.5 * erfc(-x/sqrt(2))`.
///
/// `erfc` keeps full relative precision in the lower tail, which
/// `0.5 * (1 + erf(x/sqrt(2)))` does not.
#[inline]
pub fn ndtr(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 1.0;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// `ln Φ(x)`.
///
/// Below `x = -20` `Φ` is evaluated through its asymptotic series so the
/// result stays finite long after `Φ(x)` underflows.
pub fn log_ndtr(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x > 6.0 {
        // Φ(x) = 1 - Φ(-x), with Φ(-x) tiny.
        return (-ndtr(-x)).ln_1p();
    }
    if x > -20.0 {
        return ndtr(x).ln();
    }
    if x == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    // Φ(x) ~ φ(x)/(-x) * (1 - 1/x² + 3/x⁴ - 15/x⁶ + 105/x⁸)
    let x2 = x * x;
    let inv = 1.0 / x2;
    let series = 1.0 - inv * (1.0 - inv * (3.0 - inv * (15.0 - inv * 105.0)));
    -0.5 * x2 - LN_SQRT_2PI - (-x).ln() + series.ln()
}

/// Inverse standard-normal CDF (probit), `Φ⁻¹(p)`.
///
/// `p = 0` maps to `-inf`, `p = 1` to `+inf`; anything outside `[0, 1]`
/// is NaN.
#[inline]
pub fn ndtri(p: f64) -> f64 {
    if p.is_nan() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    -SQRT_2 * erfc_inv(2.0 * p)
}

/// Machine epsilon of the primal type of `S`.
#[inline]
pub fn epsilon<S: Scalar>() -> f64 {
    match S::DTYPE {
        DType::F32 => f32::EPSILON as f64,
        DType::F64 => f64::EPSILON,
    }
}

/// Stable `ln(1 + x²)`.
///
/// For `|x| > 1/sqrt(eps)` the `1` is below the precision of `x²` and `x²`
/// itself may overflow, so `2*ln|x|` is used instead.
#[inline]
pub fn log1psquare<S: Scalar>(x: S) -> S {
    let ax = x.abs();
    if ax.value() * epsilon::<S>().sqrt() > 1.0 {
        S::from_f64(2.0) * ax.ln()
    } else {
        (x * x).ln_1p()
    }
}

/// `Φ(x)` lifted into `S`.
#[inline]
pub fn ndtr_s<S: Scalar>(x: S) -> S {
    let v = x.value();
    x.chain(ndtr(v), normal_pdf(v))
}

/// `ln Φ(x)` lifted into `S`; derivative is `φ(x)/Φ(x)`.
#[inline]
pub fn log_ndtr_s<S: Scalar>(x: S) -> S {
    let v = x.value();
    let lv = log_ndtr(v);
    let d = (-0.5 * v * v - LN_SQRT_2PI - lv).exp();
    x.chain(lv, d)
}

/// `Φ⁻¹(p)` lifted into `S`; derivative is `1/φ(Φ⁻¹(p))`.
#[inline]
pub fn ndtri_s<S: Scalar>(p: S) -> S {
    let z = ndtri(p.value());
    p.chain(z, 1.0 / normal_pdf(z))
}
