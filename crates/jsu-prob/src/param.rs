//! Parameter handles.
//!
//! A distribution parameter is either a value owned by the distribution
//! ([`Param::Fixed`]) or a handle to a cell owned elsewhere
//! ([`Param::Variable`]), e.g. a parameter being optimized. Operations never
//! cache parameter values: they call [`Param::current_value`] each time.
//!
//! Each handle carries a [`ValidationPolicy`]: fixed values are checked once
//! at construction, variables on every call since they may have been
//! reassigned in between.

use std::borrow::Cow;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jsu_ad::{Dual, Dual32};
use jsu_core::{Error, Result, Shape, StaticShape};
use ndarray::{Array1, ArrayD};

use crate::tensor::{IntoArray, shape_of};

/// Whether a variable may change shape on assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapePolicy {
    /// Every assignment must keep the initial shape (static shape known).
    Fixed,
    /// Any shape may be assigned (static shape deferred).
    Dynamic,
}

/// When a parameter's constraint is checked (if validation is enabled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// Once, when the distribution is built.
    AtConstruction,
    /// On every operation, against the value read at call time.
    EveryCall,
}

/// Shared, mutable array cell.
///
/// Cloning a `Variable` clones the handle, not the data: all clones observe
/// every [`assign`](Variable::assign).
#[derive(Debug)]
pub struct Variable<T> {
    cell: Arc<RwLock<ArrayD<T>>>,
    shape_policy: ShapePolicy,
}

impl<T> Clone for Variable<T> {
    fn clone(&self) -> Self {
        Self { cell: Arc::clone(&self.cell), shape_policy: self.shape_policy }
    }
}

impl<T: Clone> Variable<T> {
    /// Variable whose shape is fixed by its initial value.
    pub fn new(value: impl IntoArray<T>) -> Self {
        Self { cell: Arc::new(RwLock::new(value.into_array())), shape_policy: ShapePolicy::Fixed }
    }

    /// Variable whose shape may change between assignments.
    pub fn with_dynamic_shape(value: impl IntoArray<T>) -> Self {
        Self {
            cell: Arc::new(RwLock::new(value.into_array())),
            shape_policy: ShapePolicy::Dynamic,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, ArrayD<T>> {
        // A writer panicking mid-assign cannot leave a torn array: assign
        // swaps a fully built value in.
        self.cell.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, ArrayD<T>> {
        self.cell.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the current value.
    pub fn read(&self) -> ArrayD<T> {
        self.read_guard().clone()
    }

    /// Current shape.
    pub fn shape(&self) -> Shape {
        shape_of(&self.read_guard())
    }

    /// Replace the value.
    ///
    /// Fails with [`Error::Validation`] when the variable has a fixed shape
    /// and `value` does not match it.
    pub fn assign(&self, value: impl IntoArray<T>) -> Result<()> {
        let value = value.into_array();
        let mut guard = self.write_guard();
        if self.shape_policy == ShapePolicy::Fixed && guard.shape() != value.shape() {
            return Err(Error::Validation(format!(
                "cannot assign value of shape {} to variable of shape {}",
                shape_of(&value),
                shape_of(&guard)
            )));
        }
        *guard = value;
        Ok(())
    }

    /// Static shape: known for fixed-shape variables, deferred otherwise.
    pub fn static_shape(&self) -> StaticShape {
        match self.shape_policy {
            ShapePolicy::Fixed => StaticShape::Known(self.shape()),
            ShapePolicy::Dynamic => StaticShape::Deferred,
        }
    }
}

/// A distribution parameter: an owned value or a variable handle.
#[derive(Debug, Clone)]
pub enum Param<T> {
    /// Value owned by the distribution.
    Fixed(ArrayD<T>),
    /// Value owned by an external cell, re-read on every access.
    Variable(Variable<T>),
}

impl<T: Clone> Param<T> {
    /// Value as of now. Borrowed for fixed values, a snapshot for variables.
    pub fn current_value(&self) -> Cow<'_, ArrayD<T>> {
        match self {
            Param::Fixed(a) => Cow::Borrowed(a),
            Param::Variable(v) => Cow::Owned(v.read()),
        }
    }

    /// Shape known without evaluation.
    pub fn static_shape(&self) -> StaticShape {
        match self {
            Param::Fixed(a) => StaticShape::Known(shape_of(a)),
            Param::Variable(v) => v.static_shape(),
        }
    }

    /// When this parameter's constraint is checked.
    pub fn validation_policy(&self) -> ValidationPolicy {
        match self {
            Param::Fixed(_) => ValidationPolicy::AtConstruction,
            Param::Variable(_) => ValidationPolicy::EveryCall,
        }
    }

    /// The variable handle, if any.
    pub fn as_variable(&self) -> Option<&Variable<T>> {
        match self {
            Param::Variable(v) => Some(v),
            Param::Fixed(_) => None,
        }
    }
}

impl<T> From<Variable<T>> for Param<T> {
    fn from(v: Variable<T>) -> Self {
        Param::Variable(v)
    }
}

impl<T> From<&Variable<T>> for Param<T> {
    fn from(v: &Variable<T>) -> Self {
        Param::Variable(v.clone())
    }
}

impl<T> From<ArrayD<T>> for Param<T> {
    fn from(a: ArrayD<T>) -> Self {
        Param::Fixed(a)
    }
}

impl<T> From<Array1<T>> for Param<T> {
    fn from(a: Array1<T>) -> Self {
        Param::Fixed(a.into_dyn())
    }
}

impl<T> From<Vec<T>> for Param<T> {
    fn from(v: Vec<T>) -> Self {
        Param::Fixed(v.into_array())
    }
}

impl<T, const N: usize> From<[T; N]> for Param<T> {
    fn from(v: [T; N]) -> Self {
        Param::Fixed(v.into_array())
    }
}

macro_rules! impl_scalar_param {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Param<$t> {
                fn from(v: $t) -> Self {
                    Param::Fixed(v.into_array())
                }
            }
        )*
    };
}

impl_scalar_param!(f64, f32, Dual, Dual32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_shared_between_clones() {
        let v = Variable::new(vec![1.0f64, 2.0]);
        let p: Param<f64> = (&v).into();
        v.assign(vec![3.0, 4.0]).unwrap();
        assert_eq!(p.current_value().as_slice().unwrap(), &[3.0, 4.0]);
        p.as_variable().unwrap().assign(vec![5.0, 6.0]).unwrap();
        assert_eq!(v.read().as_slice().unwrap(), &[5.0, 6.0]);
    }

    #[test]
    fn test_fixed_shape_variable_rejects_reshape() {
        let v = Variable::new(vec![1.0f64, 2.0]);
        let err = v.assign(vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(v.static_shape(), StaticShape::Known(Shape::from([2])));
    }

    #[test]
    fn test_dynamic_shape_variable() {
        let v = Variable::with_dynamic_shape(1.0f64);
        assert_eq!(v.static_shape(), StaticShape::Deferred);
        v.assign(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(v.shape(), Shape::from([3]));
    }

    #[test]
    fn test_policies() {
        let fixed: Param<f64> = 2.0f64.into();
        assert_eq!(fixed.validation_policy(), ValidationPolicy::AtConstruction);
        assert_eq!(fixed.static_shape(), StaticShape::scalar());
        assert!(matches!(fixed.current_value(), Cow::Borrowed(_)));

        let var: Param<f64> = Variable::new(2.0f64).into();
        assert_eq!(var.validation_policy(), ValidationPolicy::EveryCall);
        assert!(var.as_variable().is_some());
    }
}
