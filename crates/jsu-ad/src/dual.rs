//! Forward-mode automatic differentiation via dual numbers.
//!
//! A dual number carries a primal value and one tangent. Seeding a single
//! input with `var` and evaluating a function yields the function value and
//! its derivative with respect to that input in the same pass.
//!
//! [`Dual`] (f64) and [`Dual32`](crate::dual32::Dual32) (f32) are generated
//! from the same macro definition.

/// Define a dual-number type `$name` over the float `$f`.
macro_rules! forward_dual {
    ($(#[$meta:meta])* $name:ident, $f:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Default)]
        pub struct $name {
            /// Primal value.
            pub val: $f,
            /// Tangent.
            pub dot: $f,
        }

        impl $name {
            /// Constant (zero tangent).
            #[inline]
            pub fn constant(val: $f) -> Self {
                Self { val, dot: 0.0 }
            }

            /// Independent variable (unit tangent).
            #[inline]
            pub fn var(val: $f) -> Self {
                Self { val, dot: 1.0 }
            }

            /// Explicit value and tangent.
            #[inline]
            pub fn new(val: $f, dot: $f) -> Self {
                Self { val, dot }
            }

            /// Lift a unary function evaluated elsewhere: `f` is its value
            /// and `df` its derivative at `self.val`.
            #[inline]
            pub fn chain(self, f: $f, df: $f) -> Self {
                Self { val: f, dot: self.dot * df }
            }

            /// `ln(x)`
            #[inline]
            pub fn ln(self) -> Self {
                self.chain(self.val.ln(), 1.0 / self.val)
            }

            /// `ln(1 + x)`
            #[inline]
            pub fn ln_1p(self) -> Self {
                self.chain(self.val.ln_1p(), 1.0 / (1.0 + self.val))
            }

            /// `exp(x)`
            #[inline]
            pub fn exp(self) -> Self {
                let e = self.val.exp();
                self.chain(e, e)
            }

            /// `exp(x) - 1`
            #[inline]
            pub fn exp_m1(self) -> Self {
                self.chain(self.val.exp_m1(), self.val.exp())
            }

            /// `sqrt(x)`
            #[inline]
            pub fn sqrt(self) -> Self {
                let r = self.val.sqrt();
                self.chain(r, 0.5 / r)
            }

            /// `sinh(x)`
            #[inline]
            pub fn sinh(self) -> Self {
                self.chain(self.val.sinh(), self.val.cosh())
            }

            /// `cosh(x)`
            #[inline]
            pub fn cosh(self) -> Self {
                self.chain(self.val.cosh(), self.val.sinh())
            }

            /// `asinh(x)`; derivative `1/sqrt(1 + x²)`.
            #[inline]
            pub fn asinh(self) -> Self {
                self.chain(self.val.asinh(), 1.0 / self.val.mul_add(self.val, 1.0).sqrt())
            }

            /// `|x|`
            #[inline]
            pub fn abs(self) -> Self {
                self.chain(self.val.abs(), self.val.signum())
            }
        }

        impl std::ops::Add for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                Self { val: self.val + rhs.val, dot: self.dot + rhs.dot }
            }
        }

        impl std::ops::Sub for $name {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                Self { val: self.val - rhs.val, dot: self.dot - rhs.dot }
            }
        }

        impl std::ops::Mul for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: Self) -> Self {
                Self { val: self.val * rhs.val, dot: self.dot * rhs.val + self.val * rhs.dot }
            }
        }

        impl std::ops::Div for $name {
            type Output = Self;
            #[inline]
            fn div(self, rhs: Self) -> Self {
                let q = self.val / rhs.val;
                Self { val: q, dot: (self.dot - q * rhs.dot) / rhs.val }
            }
        }

        impl std::ops::Neg for $name {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                Self { val: -self.val, dot: -self.dot }
            }
        }

        impl std::ops::Add<$f> for $name {
            type Output = Self;
            #[inline]
            fn add(self, rhs: $f) -> Self {
                Self { val: self.val + rhs, dot: self.dot }
            }
        }

        impl std::ops::Mul<$f> for $name {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: $f) -> Self {
                Self { val: self.val * rhs, dot: self.dot * rhs }
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::constant(0.0), |acc, x| acc + x)
            }
        }

        impl From<$f> for $name {
            fn from(val: $f) -> Self {
                Self::constant(val)
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                self.val.partial_cmp(&other.val)
            }
        }
    };
}

pub(crate) use forward_dual;

forward_dual!(
    /// f64 dual number for forward-mode AD.
    Dual,
    f64
);
