//! Shapes and broadcasting.
//!
//! Two views of a shape exist side by side:
//! - [`Shape`]: a concrete list of dimensions, always known (dynamic view).
//! - [`StaticShape`]: what can be said about a shape without reading any
//!   data. Either [`StaticShape::Known`] or [`StaticShape::Deferred`] when the
//!   shape is only fixed at evaluation time (e.g. a variable whose shape may
//!   change between assignments).
//!
//! Broadcasting follows the usual trailing-alignment rule: dimensions are
//! compared right to left and are compatible when equal or when one of them
//! is `1`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Concrete shape of an n-dimensional array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Shape from a list of dimensions.
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    /// The empty (rank-0) shape of a scalar.
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    /// Dimensions, outermost first.
    #[inline]
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    #[inline]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the rank-0 shape.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of elements (1 for a scalar).
    pub fn num_elements(&self) -> usize {
        self.0.iter().product()
    }

    /// `outer ++ self`.
    pub fn prepend(&self, outer: &[usize]) -> Shape {
        let mut dims = Vec::with_capacity(outer.len() + self.0.len());
        dims.extend_from_slice(outer);
        dims.extend_from_slice(&self.0);
        Shape(dims)
    }

    /// Broadcast two shapes; `None` when they are incompatible.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        broadcast_dims(&self.0, &other.0).map(Shape)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

/// Broadcast two dimension lists.
///
/// `[2, 1]` with `[3]` gives `[2, 3]`; `[2]` with `[3]` is incompatible.
pub fn broadcast_dims(a: &[usize], b: &[usize]) -> Option<Vec<usize>> {
    let rank = a.len().max(b.len());
    let mut out = vec![0usize; rank];
    for i in 0..rank {
        let da = if i < a.len() { a[a.len() - 1 - i] } else { 1 };
        let db = if i < b.len() { b[b.len() - 1 - i] } else { 1 };
        out[rank - 1 - i] = match (da, db) {
            _ if da == db => da,
            (1, d) | (d, 1) => d,
            _ => return None,
        };
    }
    Some(out)
}

/// Broadcast any number of shapes, left to right.
///
/// An empty iterator yields the scalar shape.
pub fn broadcast_all<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Option<Shape> {
    shapes.into_iter().try_fold(Shape::scalar(), |acc, s| acc.broadcast(s))
}

/// Shape information available without reading any data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaticShape {
    /// Fully known shape.
    Known(Shape),
    /// Known only at evaluation time.
    Deferred,
}

impl StaticShape {
    /// The scalar shape, known.
    pub fn scalar() -> Self {
        StaticShape::Known(Shape::scalar())
    }

    /// Whether the shape is fully known.
    #[inline]
    pub fn is_known(&self) -> bool {
        matches!(self, StaticShape::Known(_))
    }

    /// The known shape, if any.
    pub fn known(&self) -> Option<&Shape> {
        match self {
            StaticShape::Known(s) => Some(s),
            StaticShape::Deferred => None,
        }
    }
}

impl From<Shape> for StaticShape {
    fn from(s: Shape) -> Self {
        StaticShape::Known(s)
    }
}

impl fmt::Display for StaticShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticShape::Known(s) => write!(f, "{}", s),
            StaticShape::Deferred => write!(f, "<unknown>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_broadcast_basic() {
        let a = Shape::from([2, 1]);
        let b = Shape::from([3]);
        assert_eq!(a.broadcast(&b), Some(Shape::from([2, 3])));
        assert_eq!(Shape::scalar().broadcast(&b), Some(b.clone()));
        assert_eq!(Shape::from([2]).broadcast(&Shape::from([3])), None);
    }

    #[test]
    fn test_broadcast_zero_sized() {
        assert_eq!(Shape::from([0]).broadcast(&Shape::from([1])), Some(Shape::from([0])));
        assert_eq!(Shape::from([0]).broadcast(&Shape::from([2])), None);
    }

    #[test]
    fn test_broadcast_all() {
        let shapes =
            [Shape::scalar(), Shape::from([2]), Shape::from([1, 2]), Shape::from([4, 1])];
        assert_eq!(broadcast_all(&shapes), Some(Shape::from([4, 2])));
        assert_eq!(broadcast_all(std::iter::empty()), Some(Shape::scalar()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Shape::from([2, 3]).to_string(), "[2, 3]");
        assert_eq!(Shape::scalar().to_string(), "[]");
        assert_eq!(StaticShape::Deferred.to_string(), "<unknown>");
    }

    #[test]
    fn test_prepend() {
        let s = Shape::from([2]).prepend(&[5, 4]);
        assert_eq!(s.dims(), &[5, 4, 2]);
        assert_eq!(s.num_elements(), 40);
    }

    proptest! {
        #[test]
        fn prop_broadcast_commutes(
            a in proptest::collection::vec(1usize..4, 0..4),
            b in proptest::collection::vec(1usize..4, 0..4),
        ) {
            prop_assert_eq!(broadcast_dims(&a, &b), broadcast_dims(&b, &a));
        }

        #[test]
        fn prop_broadcast_with_self_and_scalar(a in proptest::collection::vec(0usize..5, 0..4)) {
            let s = Shape::new(a.clone());
            prop_assert_eq!(s.broadcast(&s), Some(s.clone()));
            prop_assert_eq!(s.broadcast(&Shape::scalar()), Some(s.clone()));
        }
    }
}
