//! Base trait shared by batched scalar distributions.
//!
//! Implementors provide shapes, `sample_n`, `log_prob`, `cdf`, `quantile`
//! and the first two moments; everything derivable from those (`sample` with
//! an arbitrary sample shape, `prob`, `log_cdf`, survival functions,
//! `stddev`) comes with a default.

use jsu_ad::Scalar;
use jsu_core::{DType, DistributionOptions, ReparameterizationType, Result, Shape, StaticShape};
use ndarray::ArrayD;

use crate::tensor::{IntoArray, reshape};

/// A batch of independent distributions over scalars or arrays of `T`.
pub trait Distribution<T: Scalar> {
    /// Construction options (name, validation and NaN-statistics flags).
    fn options(&self) -> &DistributionOptions;

    /// Display name.
    fn name(&self) -> &str {
        &self.options().name
    }

    /// Element type.
    fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// How gradients flow through samples.
    fn reparameterization_type(&self) -> ReparameterizationType;

    /// Batch shape from static information only.
    fn batch_shape(&self) -> StaticShape;

    /// Batch shape from the parameter values as of now.
    fn batch_shape_tensor(&self) -> Result<Shape>;

    /// Shape of a single draw, statically.
    fn event_shape(&self) -> StaticShape;

    /// Shape of a single draw.
    fn event_shape_tensor(&self) -> Shape;

    /// `n` draws per batch member; shape `[n] + batch_shape + event_shape`.
    fn sample_n(&self, n: usize, seed: Option<u64>) -> Result<ArrayD<T>>;

    /// Draws with shape `sample_shape + batch_shape + event_shape`.
    fn sample(&self, sample_shape: &[usize], seed: Option<u64>) -> Result<ArrayD<T>> {
        let n: usize = sample_shape.iter().product();
        let flat = self.sample_n(n, seed)?;
        let tail = &flat.shape()[1..];
        let dims: Vec<usize> = sample_shape.iter().chain(tail.iter()).copied().collect();
        reshape(flat, &dims)
    }

    /// Log-density at `x`, broadcast against the batch shape.
    fn log_prob(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>>;

    /// Density at `x`.
    fn prob(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        Ok(self.log_prob(x)?.mapv(|v| v.exp()))
    }

    /// Cumulative distribution function at `x`.
    fn cdf(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>>;

    /// `ln cdf(x)`.
    fn log_cdf(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        Ok(self.cdf(x)?.mapv(|v| v.ln()))
    }

    /// `1 - cdf(x)`.
    fn survival_function(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        Ok(self.cdf(x)?.mapv(|v| T::from_f64(1.0) - v))
    }

    /// `ln(1 - cdf(x))`.
    fn log_survival_function(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        Ok(self.survival_function(x)?.mapv(|v| v.ln()))
    }

    /// Inverse CDF at probability `p`.
    fn quantile(&self, p: impl IntoArray<T>) -> Result<ArrayD<T>>;

    /// Mean, shape `batch_shape`.
    fn mean(&self) -> Result<ArrayD<T>>;

    /// Variance, shape `batch_shape`.
    fn variance(&self) -> Result<ArrayD<T>>;

    /// Standard deviation, shape `batch_shape`.
    fn stddev(&self) -> Result<ArrayD<T>> {
        Ok(self.variance()?.mapv(|v| v.sqrt()))
    }

    /// Whether draws are scalars. `None` if the event shape is deferred.
    fn is_scalar_event(&self) -> Option<bool> {
        self.event_shape().known().map(Shape::is_scalar)
    }

    /// Whether the batch holds a single distribution. `None` if deferred.
    fn is_scalar_batch(&self) -> Option<bool> {
        self.batch_shape().known().map(Shape::is_scalar)
    }
}
