//! [`Scalar`] trait: abstraction over `f64`, `f32`, [`Dual`](crate::dual::Dual)
//! and [`Dual32`](crate::dual32::Dual32) that enables writing density,
//! sampling and moment formulas once, then reusing them for both evaluation
//! **and** forward-mode gradient computation.

use crate::dual::Dual;
use crate::dual32::Dual32;
use jsu_core::DType;
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A scalar type suitable for distribution math.
///
/// Implemented for `f64`, `f32` (plain evaluation) and `Dual`, `Dual32`
/// (forward-mode AD).
pub trait Scalar:
    Copy
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Sum
    + PartialOrd
    + Send
    + Sync
    + Sized
    + 'static
{
    /// Element type of the primal value.
    const DTYPE: DType;

    /// Wrap an `f64` constant (derivative = 0 for AD types).
    fn from_f64(v: f64) -> Self;

    /// Extract the primal (function) value.
    fn value(&self) -> f64;

    /// Natural logarithm.
    fn ln(self) -> Self;

    /// `ln(1 + x)`, accurate near zero.
    fn ln_1p(self) -> Self;

    /// Exponential.
    fn exp(self) -> Self;

    /// `exp(x) - 1`, accurate near zero.
    fn exp_m1(self) -> Self;

    /// Square root.
    fn sqrt(self) -> Self;

    /// Hyperbolic sine.
    fn sinh(self) -> Self;

    /// Hyperbolic cosine.
    fn cosh(self) -> Self;

    /// Inverse hyperbolic sine.
    fn asinh(self) -> Self;

    /// Absolute value.
    fn abs(self) -> Self;

    /// Apply a unary function evaluated outside the AD system: `f` is its
    /// value and `df` its derivative at `self.value()`.
    fn chain(self, f: f64, df: f64) -> Self;

    /// Whether the primal value is NaN.
    #[inline]
    fn is_nan(&self) -> bool {
        self.value().is_nan()
    }
}

macro_rules! impl_scalar_float {
    ($t:ty, $dtype:ident) => {
        impl Scalar for $t {
            const DTYPE: DType = DType::$dtype;

            #[inline]
            fn from_f64(v: f64) -> Self {
                v as $t
            }
            #[inline]
            fn value(&self) -> f64 {
                *self as f64
            }
            #[inline]
            fn ln(self) -> Self {
                <$t>::ln(self)
            }
            #[inline]
            fn ln_1p(self) -> Self {
                <$t>::ln_1p(self)
            }
            #[inline]
            fn exp(self) -> Self {
                <$t>::exp(self)
            }
            #[inline]
            fn exp_m1(self) -> Self {
                <$t>::exp_m1(self)
            }
            #[inline]
            fn sqrt(self) -> Self {
                <$t>::sqrt(self)
            }
            #[inline]
            fn sinh(self) -> Self {
                <$t>::sinh(self)
            }
            #[inline]
            fn cosh(self) -> Self {
                <$t>::cosh(self)
            }
            #[inline]
            fn asinh(self) -> Self {
                <$t>::asinh(self)
            }
            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }
            // The derivative is irrelevant for plain floats.
            #[inline]
            fn chain(self, f: f64, _df: f64) -> Self {
                f as $t
            }
        }
    };
}

macro_rules! impl_scalar_dual {
    ($t:ident, $f:ty, $dtype:ident) => {
        impl Scalar for $t {
            const DTYPE: DType = DType::$dtype;

            #[inline]
            fn from_f64(v: f64) -> Self {
                $t::constant(v as $f)
            }
            #[inline]
            fn value(&self) -> f64 {
                self.val as f64
            }
            #[inline]
            fn ln(self) -> Self {
                $t::ln(self)
            }
            #[inline]
            fn ln_1p(self) -> Self {
                $t::ln_1p(self)
            }
            #[inline]
            fn exp(self) -> Self {
                $t::exp(self)
            }
            #[inline]
            fn exp_m1(self) -> Self {
                $t::exp_m1(self)
            }
            #[inline]
            fn sqrt(self) -> Self {
                $t::sqrt(self)
            }
            #[inline]
            fn sinh(self) -> Self {
                $t::sinh(self)
            }
            #[inline]
            fn cosh(self) -> Self {
                $t::cosh(self)
            }
            #[inline]
            fn asinh(self) -> Self {
                $t::asinh(self)
            }
            #[inline]
            fn abs(self) -> Self {
                $t::abs(self)
            }
            #[inline]
            fn chain(self, f: f64, df: f64) -> Self {
                $t::chain(self, f as $f, df as $f)
            }
        }
    };
}

impl_scalar_float!(f64, F64);
impl_scalar_float!(f32, F32);
impl_scalar_dual!(Dual, f64, F64);
impl_scalar_dual!(Dual32, f32, F32);

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Generic Johnson-SU style transform `scale * sinh((z - gamma) / delta) + loc`.
    fn su_transform<S: Scalar>(z: f64, gamma: S, delta: S, loc: S, scale: S) -> S {
        scale * ((S::from_f64(z) - gamma) / delta).sinh() + loc
    }

    #[test]
    fn test_scalar_f64_value() {
        let v: f64 = su_transform(0.5, 1.0, 2.0, 3.0, 4.0);
        assert_relative_eq!(v, 4.0 * (-0.25f64).sinh() + 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scalar_dual_matches_f64_and_gradient() {
        let (z, g, d, l, s) = (0.5, 1.0, 2.0, 3.0, 4.0);
        let w: f64 = (z - g) / d;

        // d/ds = sinh(w)
        let ds = su_transform(z, Dual::constant(g), Dual::constant(d), Dual::constant(l), Dual::var(s));
        assert_relative_eq!(ds.val, su_transform::<f64>(z, g, d, l, s), epsilon = 1e-12);
        assert_relative_eq!(ds.dot, w.sinh(), epsilon = 1e-12);

        // d/dgamma = -s cosh(w) / d
        let dg = su_transform(z, Dual::var(g), Dual::constant(d), Dual::constant(l), Dual::constant(s));
        assert_relative_eq!(dg.dot, -s * w.cosh() / d, epsilon = 1e-12);

        // d/ddelta = -s cosh(w) w / d
        let dd = su_transform(z, Dual::constant(g), Dual::var(d), Dual::constant(l), Dual::constant(s));
        assert_relative_eq!(dd.dot, -s * w.cosh() * w / d, epsilon = 1e-12);

        // d/dloc = 1
        let dl = su_transform(z, Dual::constant(g), Dual::constant(d), Dual::var(l), Dual::constant(s));
        assert_relative_eq!(dl.dot, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scalar_f32_roundtrip() {
        let v = <f32 as Scalar>::from_f64(1.25);
        assert_eq!(v.value(), 1.25);
        assert_eq!(<f32 as Scalar>::DTYPE, DType::F32);
        assert_eq!(<Dual as Scalar>::DTYPE, DType::F64);
    }

    #[test]
    fn test_is_nan() {
        assert!(Scalar::is_nan(&f64::NAN));
        assert!(Dual::constant(f64::NAN).is_nan());
        assert!(!Dual32::var(1.0).is_nan());
    }
}
