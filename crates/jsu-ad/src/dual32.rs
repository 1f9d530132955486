//! Single-precision dual numbers.
//!
//! Same definition as [`Dual`](crate::dual::Dual) over `f32`, so `float32`
//! parameter batches get pathwise derivatives through the same generic code.

use crate::dual::forward_dual;

forward_dual!(
    /// f32 dual number for forward-mode AD.
    Dual32,
    f32
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_has_zero_derivative() {
        let c = Dual32::constant(5.0);
        assert_eq!(c.val, 5.0);
        assert_eq!(c.dot, 0.0);
    }

    #[test]
    fn test_var_has_unit_derivative() {
        let x = Dual32::var(3.0);
        assert_eq!(x.val, 3.0);
        assert_eq!(x.dot, 1.0);
    }

    #[test]
    fn test_asinh_derivative() {
        // d/dx asinh(x) = 1/sqrt(1+x^2)
        let x = Dual32::var(0.75);
        let y = x.asinh();
        assert!((y.val - 0.75_f32.asinh()).abs() < 1e-6);
        assert!((y.dot - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_sinh_derivative() {
        let x = Dual32::var(1.0);
        let y = x.sinh();
        assert!((y.val - 1.0_f32.sinh()).abs() < 1e-6);
        assert!((y.dot - 1.0_f32.cosh()).abs() < 1e-6);
    }

    #[test]
    fn test_scale_times_sinh_plus_loc() {
        // f(s) = s * sinh(w) + l, df/ds = sinh(w)
        let w = Dual32::constant(0.4);
        let s = Dual32::var(1.5);
        let l = Dual32::constant(-2.0);
        let f = s * w.sinh() + l;
        assert!((f.dot - 0.4_f32.sinh()).abs() < 1e-6);
    }
}
