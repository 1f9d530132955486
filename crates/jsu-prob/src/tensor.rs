//! Array conversions and broadcasting on top of `ndarray`.

use jsu_ad::{Dual, Dual32};
use jsu_core::{Error, Result, Shape};
use ndarray::{Array1, ArrayD, ArrayViewD, IxDyn};

/// Conversion into a dynamic-rank array.
///
/// Implemented for scalars, `Vec`, fixed-size arrays, slices and `ndarray`
/// arrays, so every operation accepts `0.5`, `vec![..]` or an `ArrayD` alike.
pub trait IntoArray<T> {
    /// Convert into an owned `ArrayD`.
    fn into_array(self) -> ArrayD<T>;
}

macro_rules! impl_scalar_into_array {
    ($($t:ty),*) => {
        $(
            impl IntoArray<$t> for $t {
                #[inline]
                fn into_array(self) -> ArrayD<$t> {
                    ArrayD::from_elem(IxDyn(&[]), self)
                }
            }
        )*
    };
}

impl_scalar_into_array!(f64, f32, Dual, Dual32);

impl<T> IntoArray<T> for ArrayD<T> {
    #[inline]
    fn into_array(self) -> ArrayD<T> {
        self
    }
}

impl<T: Clone> IntoArray<T> for &ArrayD<T> {
    #[inline]
    fn into_array(self) -> ArrayD<T> {
        self.clone()
    }
}

impl<T> IntoArray<T> for Array1<T> {
    #[inline]
    fn into_array(self) -> ArrayD<T> {
        self.into_dyn()
    }
}

impl<T> IntoArray<T> for Vec<T> {
    #[inline]
    fn into_array(self) -> ArrayD<T> {
        Array1::from_vec(self).into_dyn()
    }
}

impl<T: Clone> IntoArray<T> for &[T] {
    #[inline]
    fn into_array(self) -> ArrayD<T> {
        Array1::from_vec(self.to_vec()).into_dyn()
    }
}

impl<T, const N: usize> IntoArray<T> for [T; N] {
    #[inline]
    fn into_array(self) -> ArrayD<T> {
        Array1::from_vec(Vec::from(self)).into_dyn()
    }
}

/// Shape of an array.
#[inline]
pub fn shape_of<T>(a: &ArrayD<T>) -> Shape {
    Shape::from(a.shape())
}

/// Broadcast view of `a` with shape `target`.
pub fn broadcast_to<'a, T>(
    a: &'a ArrayD<T>,
    target: &Shape,
    what: &str,
) -> Result<ArrayViewD<'a, T>> {
    a.broadcast(IxDyn(target.dims())).ok_or_else(|| {
        Error::IncompatibleShapes(format!(
            "cannot broadcast `{}` with shape {} to {}",
            what,
            shape_of(a),
            target
        ))
    })
}

/// Broadcast shape of `a` and `b`, reported as an error when incompatible.
pub fn broadcast_pair(a: &Shape, b: &Shape, what: &str) -> Result<Shape> {
    a.broadcast(b).ok_or_else(|| {
        Error::IncompatibleShapes(format!("{}: shapes {} and {} do not broadcast", what, a, b))
    })
}

/// Rebuild `a` (logically, in row-major order) with a new shape of equal size.
pub fn reshape<T: Clone>(a: ArrayD<T>, dims: &[usize]) -> Result<ArrayD<T>> {
    let flat: Vec<T> = a.iter().cloned().collect();
    ArrayD::from_shape_vec(IxDyn(dims), flat)
        .map_err(|e| Error::Validation(format!("cannot reshape to {:?}: {}", dims, e)))
}
