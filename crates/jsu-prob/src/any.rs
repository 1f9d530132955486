//! Runtime-typed front end.
//!
//! [`JohnsonSU<T>`] fixes the element type at compile time, so mixing `f32`
//! and `f64` parameters is a type error there. Callers that receive arrays of
//! either width at runtime (config files, bindings) go through
//! [`AnyJohnsonSU`], which checks that all parameters share one dtype and
//! reports [`Error::TypeMismatch`] otherwise.

use jsu_core::{DType, DistributionOptions, Error, Result, Shape, StaticShape};
use ndarray::ArrayD;

use crate::distribution::Distribution;
use crate::johnson_su::JohnsonSU;
use crate::tensor::{IntoArray, shape_of};

/// Array of either float width.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyTensor {
    /// `float32` values.
    F32(ArrayD<f32>),
    /// `float64` values.
    F64(ArrayD<f64>),
}

impl AnyTensor {
    /// Element type.
    pub fn dtype(&self) -> DType {
        match self {
            AnyTensor::F32(_) => DType::F32,
            AnyTensor::F64(_) => DType::F64,
        }
    }

    /// Shape.
    pub fn shape(&self) -> Shape {
        match self {
            AnyTensor::F32(a) => shape_of(a),
            AnyTensor::F64(a) => shape_of(a),
        }
    }

    /// The `float64` values, if that is the dtype.
    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            AnyTensor::F64(a) => Some(a),
            AnyTensor::F32(_) => None,
        }
    }

    /// The `float32` values, if that is the dtype.
    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            AnyTensor::F32(a) => Some(a),
            AnyTensor::F64(_) => None,
        }
    }
}

macro_rules! impl_any_tensor_from {
    ($variant:ident, $t:ty) => {
        impl From<$t> for AnyTensor {
            fn from(v: $t) -> Self {
                AnyTensor::$variant(v.into_array())
            }
        }

        impl From<Vec<$t>> for AnyTensor {
            fn from(v: Vec<$t>) -> Self {
                AnyTensor::$variant(v.into_array())
            }
        }

        impl From<ArrayD<$t>> for AnyTensor {
            fn from(v: ArrayD<$t>) -> Self {
                AnyTensor::$variant(v)
            }
        }
    };
}

impl_any_tensor_from!(F32, f32);
impl_any_tensor_from!(F64, f64);

/// Johnson's SU distribution with its dtype chosen at runtime.
#[derive(Debug, Clone)]
pub enum AnyJohnsonSU {
    /// `float32` parameters.
    F32(JohnsonSU<f32>),
    /// `float64` parameters.
    F64(JohnsonSU<f64>),
}

impl AnyJohnsonSU {
    /// Build from runtime-typed parameters.
    ///
    /// Fails with [`Error::TypeMismatch`] unless all four share one dtype.
    pub fn new(
        gamma: impl Into<AnyTensor>,
        delta: impl Into<AnyTensor>,
        loc: impl Into<AnyTensor>,
        scale: impl Into<AnyTensor>,
        options: DistributionOptions,
    ) -> Result<Self> {
        use AnyTensor::{F32, F64};
        match (gamma.into(), delta.into(), loc.into(), scale.into()) {
            (F64(g), F64(d), F64(l), F64(s)) => Ok(Self::F64(JohnsonSU::new(g, d, l, s, options)?)),
            (F32(g), F32(d), F32(l), F32(s)) => Ok(Self::F32(JohnsonSU::new(g, d, l, s, options)?)),
            (g, d, l, s) => Err(Error::TypeMismatch(format!(
                "Parameters must share one dtype; gamma.dtype={}, delta.dtype={}, loc.dtype={}, scale.dtype={}",
                g.dtype(),
                d.dtype(),
                l.dtype(),
                s.dtype()
            ))),
        }
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        match self {
            Self::F32(d) => d.dtype(),
            Self::F64(d) => d.dtype(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::F32(d) => d.name(),
            Self::F64(d) => d.name(),
        }
    }

    /// Static batch shape.
    pub fn batch_shape(&self) -> StaticShape {
        match self {
            Self::F32(d) => d.batch_shape(),
            Self::F64(d) => d.batch_shape(),
        }
    }

    /// Batch shape from the current parameter values.
    pub fn batch_shape_tensor(&self) -> Result<Shape> {
        match self {
            Self::F32(d) => d.batch_shape_tensor(),
            Self::F64(d) => d.batch_shape_tensor(),
        }
    }

    /// `n` draws per batch member.
    pub fn sample_n(&self, n: usize, seed: Option<u64>) -> Result<AnyTensor> {
        match self {
            Self::F32(d) => d.sample_n(n, seed).map(AnyTensor::F32),
            Self::F64(d) => d.sample_n(n, seed).map(AnyTensor::F64),
        }
    }

    /// Mean.
    pub fn mean(&self) -> Result<AnyTensor> {
        match self {
            Self::F32(d) => d.mean().map(AnyTensor::F32),
            Self::F64(d) => d.mean().map(AnyTensor::F64),
        }
    }

    /// Variance.
    pub fn variance(&self) -> Result<AnyTensor> {
        match self {
            Self::F32(d) => d.variance().map(AnyTensor::F32),
            Self::F64(d) => d.variance().map(AnyTensor::F64),
        }
    }

    /// Log-density. `x` must have the distribution's dtype.
    pub fn log_prob(&self, x: impl Into<AnyTensor>) -> Result<AnyTensor> {
        match (self, x.into()) {
            (Self::F32(d), AnyTensor::F32(x)) => d.log_prob(x).map(AnyTensor::F32),
            (Self::F64(d), AnyTensor::F64(x)) => d.log_prob(x).map(AnyTensor::F64),
            (_, x) => Err(self.value_mismatch("log_prob", &x)),
        }
    }

    /// CDF. `x` must have the distribution's dtype.
    pub fn cdf(&self, x: impl Into<AnyTensor>) -> Result<AnyTensor> {
        match (self, x.into()) {
            (Self::F32(d), AnyTensor::F32(x)) => d.cdf(x).map(AnyTensor::F32),
            (Self::F64(d), AnyTensor::F64(x)) => d.cdf(x).map(AnyTensor::F64),
            (_, x) => Err(self.value_mismatch("cdf", &x)),
        }
    }

    fn value_mismatch(&self, op: &str, x: &AnyTensor) -> Error {
        Error::TypeMismatch(format!(
            "{}: value has dtype {} but the distribution has dtype {}",
            op,
            x.dtype(),
            self.dtype()
        ))
    }
}

impl From<JohnsonSU<f64>> for AnyJohnsonSU {
    fn from(d: JohnsonSU<f64>) -> Self {
        Self::F64(d)
    }
}

impl From<JohnsonSU<f32>> for AnyJohnsonSU {
    fn from(d: JohnsonSU<f32>) -> Self {
        Self::F32(d)
    }
}
