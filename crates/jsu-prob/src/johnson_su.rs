//! Johnson's SU distribution.
//!
//! Parameterized by shape parameters `gamma` and `delta > 0`, location `loc`
//! and scale `scale > 0`. With `y = (x - loc) / scale`:
//!
//! ```text
//! pdf(x) = delta / (scale * sqrt(2π) * sqrt(1 + y²)) * exp(-0.5 * (gamma + delta * asinh(y))²)
//! cdf(x) = Φ(gamma + delta * asinh(y))
//! ```
//!
//! Equivalently `X = loc + scale * sinh((Z - gamma) / delta)` with
//! `Z ~ N(0, 1)`, which is how samples are drawn. The noise `Z` does not
//! depend on the parameters, so samples are differentiable in all four of
//! them (fully reparameterized).
//!
//! `scale` is never passed through `abs`: a negative scale is accepted and
//! mirrors the sampler and quantile function.
//!
//! The module-level functions ([`logpdf`], [`cdf`], [`sample_transform`],
//! [`mean`], [`variance`], ...) are the unvalidated elementwise kernels,
//! generic over [`Scalar`]; [`JohnsonSU`] broadcasts them over batches.

use std::borrow::Cow;
use std::collections::BTreeMap;

use jsu_ad::Scalar;
use jsu_core::shape::broadcast_all;
use jsu_core::{
    Constraint, DistributionOptions, Error, ReparameterizationType, Result, Shape, StaticShape,
};
use ndarray::{ArrayD, ArrayViewD, IxDyn, Zip};
use rand::Rng;
use rand::distr::Open01;
use serde::{Deserialize, Serialize};

use crate::distribution::Distribution;
use crate::math::{LN_SQRT_2PI, log_ndtr_s, log1psquare, ndtr_s, ndtri, ndtri_s};
use crate::param::{Param, ValidationPolicy, Variable};
use crate::seed::SeedStream;
use crate::tensor::{IntoArray, broadcast_pair, broadcast_to, shape_of};

/// Default display name.
pub const DEFAULT_NAME: &str = "JohnsonSU";

/// Salt mixed into the seed stream used by [`JohnsonSU::sample_n`].
pub const SEED_SALT: &str = "johnson_su";

/// Parameter names, in constructor order.
pub const PARAMETER_NAMES: [&str; 4] = ["gamma", "delta", "loc", "scale"];

// ---------------------------------------------------------------------------
// Elementwise kernels
// ---------------------------------------------------------------------------

#[inline]
fn standardize<S: Scalar>(x: S, loc: S, scale: S) -> S {
    (x - loc) / scale
}

#[inline]
fn normal_argument<S: Scalar>(x: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    gamma + delta * standardize(x, loc, scale).asinh()
}

/// Log-density at `x`.
///
/// `-0.5*ln(1+y²) - 0.5*(gamma + delta*asinh(y))² - ln(scale/delta) - ln(sqrt(2π))`
#[inline]
pub fn logpdf<S: Scalar>(x: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    let half = S::from_f64(0.5);
    let y = standardize(x, loc, scale);
    let z = gamma + delta * y.asinh();
    -half * log1psquare(y) - half * z * z - (scale / delta).ln() - S::from_f64(LN_SQRT_2PI)
}

/// CDF at `x`: `Φ(gamma + delta*asinh(y))`.
#[inline]
pub fn cdf<S: Scalar>(x: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    ndtr_s(normal_argument(x, gamma, delta, loc, scale))
}

/// `ln cdf(x)`, finite deep into the lower tail.
#[inline]
pub fn log_cdf<S: Scalar>(x: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    log_ndtr_s(normal_argument(x, gamma, delta, loc, scale))
}

/// Survival function `1 - cdf(x)`, evaluated as `Φ(-(...))`.
#[inline]
pub fn survival<S: Scalar>(x: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    ndtr_s(-normal_argument(x, gamma, delta, loc, scale))
}

/// `ln(1 - cdf(x))`.
#[inline]
pub fn log_survival<S: Scalar>(x: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    log_ndtr_s(-normal_argument(x, gamma, delta, loc, scale))
}

/// Map a standard-normal variate `z` to a Johnson SU variate:
/// `scale * sinh((z - gamma) / delta) + loc`.
#[inline]
pub fn sample_transform<S: Scalar>(z: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    scale * ((z - gamma) / delta).sinh() + loc
}

/// Quantile at probability `p`.
#[inline]
pub fn quantile<S: Scalar>(p: S, gamma: S, delta: S, loc: S, scale: S) -> S {
    sample_transform(ndtri_s(p), gamma, delta, loc, scale)
}

/// Mean: `loc - scale * exp(0.5/delta²) * sinh(gamma/delta)`.
#[inline]
pub fn mean<S: Scalar>(gamma: S, delta: S, loc: S, scale: S) -> S {
    loc - scale * (S::from_f64(0.5) / (delta * delta)).exp() * (gamma / delta).sinh()
}

/// Variance:
/// `0.5 * scale² * expm1(1/delta²) * (exp(1/delta²) * cosh(2*gamma/delta) + 1)`.
#[inline]
pub fn variance<S: Scalar>(gamma: S, delta: S, scale: S) -> S {
    let one = S::from_f64(1.0);
    let inv_d2 = one / (delta * delta);
    S::from_f64(0.5)
        * scale
        * scale
        * inv_d2.exp_m1()
        * (inv_d2.exp() * (S::from_f64(2.0) * gamma / delta).cosh() + one)
}

// ---------------------------------------------------------------------------
// Introspection types
// ---------------------------------------------------------------------------

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParameterProperties {
    /// Parameter name.
    pub name: &'static str,
    /// Rank of one parameter event (0: one scalar per batch member).
    pub event_ndims: usize,
    /// Support constraint.
    pub constraint: Constraint,
}

/// Snapshot of one parameter's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    /// Shape of the value.
    pub shape: Shape,
    /// Values in row-major order, widened to `f64`.
    pub values: Vec<f64>,
}

impl ParameterValue {
    fn capture<T: Scalar>(a: &ArrayD<T>) -> Self {
        Self { shape: shape_of(a), values: a.iter().map(Scalar::value).collect() }
    }

    fn restore<T: Scalar>(&self, name: &str) -> Result<ArrayD<T>> {
        let values: Vec<T> = self.values.iter().map(|&v| T::from_f64(v)).collect();
        ArrayD::from_shape_vec(IxDyn(self.shape.dims()), values).map_err(|e| {
            Error::Validation(format!("parameter `{}` does not match shape {}: {}", name, self.shape, e))
        })
    }
}

/// Serializable snapshot of a [`JohnsonSU`]: current parameter values and
/// options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JohnsonSUParameters {
    /// `gamma` shape parameter.
    pub gamma: ParameterValue,
    /// `delta` shape parameter.
    pub delta: ParameterValue,
    /// Location.
    pub loc: ParameterValue,
    /// Scale.
    pub scale: ParameterValue,
    /// Construction options.
    pub options: DistributionOptions,
}

impl JohnsonSUParameters {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from JSON.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

/// A batch of Johnson's SU distributions.
///
/// # Example
/// ```
/// use jsu_core::DistributionOptions;
/// use jsu_prob::{Distribution, JohnsonSU};
///
/// let dist = JohnsonSU::<f64>::new(1.0, vec![2.0, 5.0], vec![3.0, 6.0], vec![11.0, 22.0],
///     DistributionOptions::default()).unwrap();
/// assert_eq!(dist.batch_shape_tensor().unwrap().dims(), &[2]);
/// let draws = dist.sample_n(3, Some(42)).unwrap();
/// assert_eq!(draws.shape(), &[3, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct JohnsonSU<T> {
    gamma: Param<T>,
    delta: Param<T>,
    loc: Param<T>,
    scale: Param<T>,
    options: DistributionOptions,
    static_batch_shape: StaticShape,
}

/// Parameter values read at call time plus their broadcast batch shape.
pub(crate) struct Resolved<'a, T: Clone> {
    pub(crate) gamma: Cow<'a, ArrayD<T>>,
    pub(crate) delta: Cow<'a, ArrayD<T>>,
    pub(crate) loc: Cow<'a, ArrayD<T>>,
    pub(crate) scale: Cow<'a, ArrayD<T>>,
    pub(crate) batch: Shape,
}

impl<T: Clone> Resolved<'_, T> {
    /// All four parameters broadcast to `target`.
    pub(crate) fn views(&self, target: &Shape) -> Result<[ArrayViewD<'_, T>; 4]> {
        Ok([
            broadcast_to(&self.gamma, target, "gamma")?,
            broadcast_to(&self.delta, target, "delta")?,
            broadcast_to(&self.loc, target, "loc")?,
            broadcast_to(&self.scale, target, "scale")?,
        ])
    }
}

fn incompatible(shapes: [impl std::fmt::Display; 4]) -> Error {
    let [g, d, l, s] = shapes;
    Error::IncompatibleShapes(format!(
        "Arguments must have compatible shapes; gamma.shape={}, delta.shape={}, loc.shape={}, scale.shape={}.",
        g, d, l, s
    ))
}

impl<T: Scalar> JohnsonSU<T> {
    /// Build a batch of Johnson's SU distributions.
    ///
    /// Each parameter may be a scalar, a `Vec`, an `ndarray` array or a
    /// [`Variable`]. Fails with [`Error::IncompatibleShapes`] when the static
    /// shapes cannot broadcast, and, if `options.validate_args` is set, with
    /// [`Error::Validation`] when a fixed `delta` or `scale` is not positive.
    pub fn new(
        gamma: impl Into<Param<T>>,
        delta: impl Into<Param<T>>,
        loc: impl Into<Param<T>>,
        scale: impl Into<Param<T>>,
        options: DistributionOptions,
    ) -> Result<Self> {
        let mut options = options;
        if options.name.is_empty() {
            options.name = DEFAULT_NAME.to_string();
        }
        let mut dist = Self {
            gamma: gamma.into(),
            delta: delta.into(),
            loc: loc.into(),
            scale: scale.into(),
            options,
            static_batch_shape: StaticShape::Deferred,
        };
        dist.static_batch_shape = dist.static_shape_check()?;

        if dist.options.validate_args {
            for (name, param) in [("delta", &dist.delta), ("scale", &dist.scale)] {
                if param.validation_policy() == ValidationPolicy::AtConstruction {
                    dist.check_positive(name, &param.current_value(), ValidationPolicy::AtConstruction)?;
                }
            }
        }

        log::debug!(
            "{}: batch_shape={} validate_args={} allow_nan_stats={}",
            dist.options.name,
            dist.static_batch_shape,
            dist.options.validate_args,
            dist.options.allow_nan_stats
        );
        Ok(dist)
    }

    /// Rebuild a distribution from a [`parameters`](Self::parameters) snapshot.
    pub fn from_parameters(p: &JohnsonSUParameters) -> Result<Self> {
        Self::new(
            p.gamma.restore::<T>("gamma")?,
            p.delta.restore::<T>("delta")?,
            p.loc.restore::<T>("loc")?,
            p.scale.restore::<T>("scale")?,
            p.options.clone(),
        )
    }

    /// `gamma` shape parameter.
    pub fn gamma(&self) -> &Param<T> {
        &self.gamma
    }

    /// `delta` shape parameter.
    pub fn delta(&self) -> &Param<T> {
        &self.delta
    }

    /// Location parameter.
    pub fn loc(&self) -> &Param<T> {
        &self.loc
    }

    /// Scale parameter. Not the standard deviation, but closer to it than
    /// to the variance.
    pub fn scale(&self) -> &Param<T> {
        &self.scale
    }

    /// Variable handles among the parameters, by name.
    pub fn variables(&self) -> Vec<(&'static str, &Variable<T>)> {
        PARAMETER_NAMES
            .iter()
            .zip(self.params())
            .filter_map(|(&name, p)| p.as_variable().map(|v| (name, v)))
            .collect()
    }

    /// Static properties of each parameter, in constructor order.
    pub fn parameter_properties() -> [ParameterProperties; 4] {
        let p = |name, constraint| ParameterProperties { name, event_ndims: 0, constraint };
        [
            p("gamma", Constraint::Real),
            p("delta", Constraint::Positive),
            p("loc", Constraint::Real),
            p("scale", Constraint::Positive),
        ]
    }

    /// Parameter shapes producing samples of shape `sample_shape`: every
    /// parameter takes `sample_shape` itself.
    pub fn param_shapes(sample_shape: impl Into<Shape>) -> BTreeMap<&'static str, Shape> {
        let shape = sample_shape.into();
        PARAMETER_NAMES.iter().map(|&name| (name, shape.clone())).collect()
    }

    /// Snapshot of the current parameter values and options.
    pub fn parameters(&self) -> JohnsonSUParameters {
        JohnsonSUParameters {
            gamma: ParameterValue::capture(&self.gamma.current_value()),
            delta: ParameterValue::capture(&self.delta.current_value()),
            loc: ParameterValue::capture(&self.loc.current_value()),
            scale: ParameterValue::capture(&self.scale.current_value()),
            options: self.options.clone(),
        }
    }

    fn params(&self) -> [&Param<T>; 4] {
        [&self.gamma, &self.delta, &self.loc, &self.scale]
    }

    /// Broadcast of the static parameter shapes.
    ///
    /// Known shapes are checked against each other even when another
    /// parameter's shape is deferred.
    fn static_shape_check(&self) -> Result<StaticShape> {
        let statics = self.params().map(Param::static_shape);
        let batch = broadcast_all(statics.iter().filter_map(StaticShape::known))
            .ok_or_else(|| incompatible(statics.clone()))?;
        if !statics.iter().all(StaticShape::is_known) {
            log::debug!("{}: batch shape deferred to evaluation time", self.options.name);
            return Ok(StaticShape::Deferred);
        }
        Ok(StaticShape::Known(batch))
    }

    /// Positivity check of one parameter value.
    fn check_positive(&self, name: &str, value: &ArrayD<T>, policy: ValidationPolicy) -> Result<()> {
        if value.iter().all(|v| Constraint::Positive.contains(v.value())) {
            return Ok(());
        }
        if policy == ValidationPolicy::EveryCall {
            log::warn!("{}: variable `{}` is no longer positive", self.options.name, name);
        }
        Err(Error::Validation(format!("Argument `{}` must be positive.", name)))
    }

    /// Read every parameter once, re-validate variables on that snapshot and
    /// broadcast.
    pub(crate) fn resolve(&self) -> Result<Resolved<'_, T>> {
        let gamma = self.gamma.current_value();
        let delta = self.delta.current_value();
        let loc = self.loc.current_value();
        let scale = self.scale.current_value();
        if self.options.validate_args {
            for (name, param, value) in [("delta", &self.delta, &delta), ("scale", &self.scale, &scale)] {
                if param.validation_policy() == ValidationPolicy::EveryCall {
                    self.check_positive(name, value, ValidationPolicy::EveryCall)?;
                }
            }
        }
        let shapes = [shape_of(&gamma), shape_of(&delta), shape_of(&loc), shape_of(&scale)];
        let batch = broadcast_all(&shapes).ok_or_else(|| incompatible(shapes.clone()))?;
        Ok(Resolved { gamma, delta, loc, scale, batch })
    }

    /// Standard-normal draws `Φ⁻¹(u)`, `u ~ U(0, 1)` open, with shape
    /// `[n] + batch`.
    pub(crate) fn standard_normal_draws(n: usize, batch: &Shape, seed: Option<u64>) -> ArrayD<f64> {
        let mut stream = SeedStream::new(seed, SEED_SALT);
        let mut rng = stream.next_rng();
        let shape = batch.prepend(&[n]);
        ArrayD::from_shape_simple_fn(IxDyn(shape.dims()), || ndtri(rng.sample(Open01)))
    }

    /// Apply an elementwise kernel of `(x, gamma, delta, loc, scale)` with
    /// `x` broadcast against the batch.
    fn map_with_x<F>(&self, x: ArrayD<T>, what: &str, f: F) -> Result<ArrayD<T>>
    where
        F: Fn(T, T, T, T, T) -> T,
    {
        let r = self.resolve()?;
        let shape = broadcast_pair(&shape_of(&x), &r.batch, what)?;
        let xv = broadcast_to(&x, &shape, "x")?;
        let [g, d, l, s] = r.views(&shape)?;
        Ok(Zip::from(xv)
            .and(g)
            .and(d)
            .and(l)
            .and(s)
            .map_collect(|&x, &g, &d, &l, &s| f(x, g, d, l, s)))
    }

    /// Apply an elementwise kernel of the parameters over the full batch.
    fn map_params<F>(&self, f: F) -> Result<ArrayD<T>>
    where
        F: Fn(T, T, T, T) -> T,
    {
        let r = self.resolve()?;
        let [g, d, l, s] = r.views(&r.batch)?;
        Ok(Zip::from(g).and(d).and(l).and(s).map_collect(|&g, &d, &l, &s| f(g, d, l, s)))
    }

    fn check_statistic(&self, stat: &str, values: ArrayD<T>) -> Result<ArrayD<T>> {
        if !self.options.allow_nan_stats && values.iter().any(Scalar::is_nan) {
            return Err(Error::Computation(format!(
                "{}: {} is undefined for at least one batch member",
                self.options.name, stat
            )));
        }
        Ok(values)
    }
}

impl<T: Scalar> Distribution<T> for JohnsonSU<T> {
    fn options(&self) -> &DistributionOptions {
        &self.options
    }

    fn reparameterization_type(&self) -> ReparameterizationType {
        ReparameterizationType::FullyReparameterized
    }

    fn batch_shape(&self) -> StaticShape {
        self.static_batch_shape.clone()
    }

    fn batch_shape_tensor(&self) -> Result<Shape> {
        let shapes = self.params().map(|p| shape_of(&p.current_value()));
        broadcast_all(&shapes).ok_or_else(|| incompatible(shapes.clone()))
    }

    fn event_shape(&self) -> StaticShape {
        StaticShape::scalar()
    }

    fn event_shape_tensor(&self) -> Shape {
        Shape::scalar()
    }

    fn sample_n(&self, n: usize, seed: Option<u64>) -> Result<ArrayD<T>> {
        let r = self.resolve()?;
        let z = Self::standard_normal_draws(n, &r.batch, seed);
        let [g, d, l, s] = r.views(&shape_of(&z))?;
        Ok(Zip::from(&z)
            .and(g)
            .and(d)
            .and(l)
            .and(s)
            .map_collect(|&z, &g, &d, &l, &s| sample_transform(T::from_f64(z), g, d, l, s)))
    }

    fn log_prob(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        self.map_with_x(x.into_array(), "log_prob", logpdf)
    }

    fn cdf(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        self.map_with_x(x.into_array(), "cdf", cdf)
    }

    fn log_cdf(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        self.map_with_x(x.into_array(), "log_cdf", log_cdf)
    }

    fn survival_function(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        self.map_with_x(x.into_array(), "survival_function", survival)
    }

    fn log_survival_function(&self, x: impl IntoArray<T>) -> Result<ArrayD<T>> {
        self.map_with_x(x.into_array(), "log_survival_function", log_survival)
    }

    fn quantile(&self, p: impl IntoArray<T>) -> Result<ArrayD<T>> {
        self.map_with_x(p.into_array(), "quantile", quantile)
    }

    fn mean(&self) -> Result<ArrayD<T>> {
        let m = self.map_params(mean)?;
        self.check_statistic("mean", m)
    }

    fn variance(&self) -> Result<ArrayD<T>> {
        let v = self.map_params(|g, d, _l, s| variance(g, d, s))?;
        self.check_statistic("variance", v)
    }

    fn stddev(&self) -> Result<ArrayD<T>> {
        let v = self.map_params(|g, d, _l, s| variance(g, d, s).sqrt())?;
        self.check_statistic("stddev", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Variable;
    use approx::assert_relative_eq;
    use jsu_ad::Dual;

    fn dist(g: f64, d: f64, l: f64, s: f64) -> JohnsonSU<f64> {
        JohnsonSU::<f64>::new(g, d, l, s, DistributionOptions::default()).unwrap()
    }

    fn scalar(a: &ArrayD<f64>) -> f64 {
        assert_eq!(a.ndim(), 0);
        a[[]]
    }

    #[test]
    fn test_standard_at_zero() {
        let d = dist(0.0, 1.0, 0.0, 1.0);
        assert_relative_eq!(scalar(&d.log_prob(0.0).unwrap()), -LN_SQRT_2PI, epsilon = 1e-15);
        assert_relative_eq!(scalar(&d.cdf(0.0).unwrap()), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_reference_values() {
        let d = dist(-2.0, 2.0, 1.1, 1.5);
        let y: f64 = (1.0 - 1.1) / 1.5;
        let z = -2.0 + 2.0 * y.asinh();
        let expected_pdf =
            2.0 / (1.5 * (2.0 * std::f64::consts::PI).sqrt() * (1.0 + y * y).sqrt()) * (-0.5 * z * z).exp();
        assert_relative_eq!(scalar(&d.prob(1.0).unwrap()), expected_pdf, max_relative = 1e-13);
        assert_relative_eq!(scalar(&d.cdf(1.0).unwrap()), crate::math::ndtr(z), max_relative = 1e-13);
    }

    #[test]
    fn test_mean_variance_closed_form() {
        let d = dist(1.0, 2.0, 0.0, 1.0);
        let m = scalar(&d.mean().unwrap());
        let v = scalar(&d.variance().unwrap());
        assert_relative_eq!(m, -(0.125f64).exp() * 0.5f64.sinh(), epsilon = 1e-15);
        assert_relative_eq!(
            v,
            0.5 * 0.25f64.exp_m1() * (0.25f64.exp() * 1.0f64.cosh() + 1.0),
            epsilon = 1e-15
        );
        assert_relative_eq!(scalar(&d.stddev().unwrap()), v.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn test_survival_complements_cdf() {
        let d = dist(0.5, 1.3, -0.2, 2.0);
        let xs = vec![-30.0, -2.0, 0.0, 1.5, 40.0];
        let c = d.cdf(xs.clone()).unwrap();
        let sf = d.survival_function(xs.clone()).unwrap();
        let lc = d.log_cdf(xs.clone()).unwrap();
        let lsf = d.log_survival_function(xs).unwrap();
        for i in 0..5 {
            assert_relative_eq!(c[i] + sf[i], 1.0, epsilon = 1e-14);
            assert_relative_eq!(lc[i], c[i].ln(), epsilon = 1e-12);
            assert_relative_eq!(lsf[i], sf[i].ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_log_cdf_far_tail_finite() {
        let d = dist(0.0, 1.0, 0.0, 1.0);
        // cdf underflows to 0 but log_cdf stays finite.
        let x = -(45.0f64).sinh();
        assert_eq!(scalar(&d.cdf(x).unwrap()), 0.0);
        assert!(scalar(&d.log_cdf(x).unwrap()).is_finite());
    }

    #[test]
    fn test_quantile_inverts_cdf() {
        let d = dist(-0.7, 1.4, 2.0, 0.5);
        let ps = vec![1e-6, 0.05, 0.5, 0.9, 1.0 - 1e-6];
        let q = d.quantile(ps.clone()).unwrap();
        let back = d.cdf(q).unwrap();
        for (p, b) in ps.iter().zip(back.iter()) {
            assert_relative_eq!(p, b, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_x_broadcasts_against_batch() {
        let d = JohnsonSU::<f64>::new(0.0, 1.0, vec![0.0, 1.0], 1.0, DistributionOptions::default()).unwrap();
        let x = ArrayD::from_shape_vec(IxDyn(&[3, 1]), vec![-1.0, 0.0, 1.0]).unwrap();
        let lp = d.log_prob(x).unwrap();
        assert_eq!(lp.shape(), &[3, 2]);
        assert_relative_eq!(lp[[1, 0]], -LN_SQRT_2PI, epsilon = 1e-15);
        assert_relative_eq!(lp[[2, 1]], -LN_SQRT_2PI, epsilon = 1e-15);

        let err = d.log_prob(vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, Error::IncompatibleShapes(_)));
    }

    #[test]
    fn test_static_shape_error_lists_all_shapes() {
        let err = JohnsonSU::<f64>::new(
            vec![1.0, 2.0],
            vec![1.0, 2.0, 3.0],
            0.0,
            1.0,
            DistributionOptions::default(),
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("gamma.shape=[2]"), "{msg}");
        assert!(msg.contains("delta.shape=[3]"), "{msg}");
        assert!(msg.contains("loc.shape=[]"), "{msg}");
        assert!(msg.contains("scale.shape=[]"), "{msg}");
    }

    #[test]
    fn test_known_shapes_checked_even_with_deferred_one() {
        let g = Variable::with_dynamic_shape(0.0f64);
        let err = JohnsonSU::<f64>::new(g, vec![1.0, 2.0], vec![0.0, 1.0, 2.0], 1.0, DistributionOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::IncompatibleShapes(_)));
    }

    #[test]
    fn test_deferred_shape_fails_at_first_use() {
        let g = Variable::with_dynamic_shape(0.0f64);
        let d = JohnsonSU::<f64>::new(&g, vec![1.0, 2.0], 0.0, 1.0, DistributionOptions::default()).unwrap();
        assert_eq!(d.batch_shape(), StaticShape::Deferred);
        assert_eq!(d.batch_shape_tensor().unwrap(), Shape::from([2]));

        g.assign(vec![0.0, 0.0, 0.0]).unwrap();
        assert!(matches!(d.batch_shape_tensor(), Err(Error::IncompatibleShapes(_))));
        assert!(matches!(d.log_prob(0.0), Err(Error::IncompatibleShapes(_))));
    }

    #[test]
    fn test_variable_revalidated_every_call() {
        let delta = Variable::new(2.0f64);
        let opts = DistributionOptions::default().with_validate_args(true);
        let d = JohnsonSU::<f64>::new(0.0, &delta, 0.0, 1.0, opts).unwrap();
        assert!(d.log_prob(0.3).is_ok());

        delta.assign(-1.0).unwrap();
        let err = d.log_prob(0.3).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: Argument `delta` must be positive.");

        delta.assign(3.0).unwrap();
        assert!(d.sample_n(2, Some(1)).is_ok());
    }

    #[test]
    fn test_resolved_values_are_the_validated_snapshot() {
        let delta = Variable::new(2.0f64);
        let scale = Variable::new(vec![1.0f64, 3.0]);
        let opts = DistributionOptions::default().with_validate_args(true);
        let d = JohnsonSU::<f64>::new(0.0, &delta, 0.0, &scale, opts).unwrap();

        let r = d.resolve().unwrap();
        delta.assign(-1.0).unwrap();
        scale.assign(vec![0.0, -3.0]).unwrap();
        assert_eq!(r.delta[[]], 2.0);
        assert_eq!(r.scale.as_slice().unwrap(), &[1.0, 3.0]);
        assert!(matches!(d.resolve(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_concurrent_reassignment_never_leaks_invalid_value() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let delta = Variable::new(2.0f64);
        let opts = DistributionOptions::default().with_validate_args(true);
        let d = JohnsonSU::<f64>::new(0.0, &delta, 0.0, 1.0, opts).unwrap();
        let stop = AtomicBool::new(false);

        std::thread::scope(|s| {
            s.spawn(|| {
                while !stop.load(Ordering::Relaxed) {
                    delta.assign(2.0).unwrap();
                    delta.assign(-1.0).unwrap();
                }
            });
            for _ in 0..20_000 {
                match d.log_prob(0.3) {
                    Ok(lp) => assert!(lp[[]].is_finite(), "validated call computed {}", lp[[]]),
                    Err(e) => assert!(matches!(e, Error::Validation(_))),
                }
            }
            stop.store(true, Ordering::Relaxed);
        });
    }

    #[test]
    fn test_variable_read_at_call_time() {
        let loc = Variable::new(0.0f64);
        let d = JohnsonSU::<f64>::new(0.0, 1.0, &loc, 1.0, DistributionOptions::default()).unwrap();
        assert_relative_eq!(scalar(&d.mean().unwrap()), 0.0, epsilon = 1e-15);
        loc.assign(5.0).unwrap();
        assert_relative_eq!(scalar(&d.mean().unwrap()), 5.0, epsilon = 1e-15);
        assert_eq!(d.variables().len(), 1);
        assert_eq!(d.variables()[0].0, "loc");
    }

    #[test]
    fn test_allow_nan_stats_false_rejects_nan_moments() {
        let opts = DistributionOptions::default().with_allow_nan_stats(false);
        let d = JohnsonSU::<f64>::new(0.0, vec![1.0, f64::NAN], 0.0, 1.0, opts).unwrap();
        assert!(matches!(d.mean(), Err(Error::Computation(_))));
        assert!(matches!(d.variance(), Err(Error::Computation(_))));

        let d = JohnsonSU::<f64>::new(0.0, vec![1.0, f64::NAN], 0.0, 1.0, DistributionOptions::default())
            .unwrap();
        assert!(d.mean().unwrap()[1].is_nan());
    }

    #[test]
    fn test_negative_scale_mirrors_samples() {
        let pos = dist(0.0, 1.5, 0.0, 2.0);
        let neg = dist(0.0, 1.5, 0.0, -2.0);
        let a = pos.sample_n(64, Some(9)).unwrap();
        let b = neg.sample_n(64, Some(9)).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert_relative_eq!(*x, -*y, epsilon = 1e-12);
        }
        // Mirrored mean as well.
        assert_relative_eq!(
            scalar(&neg.mean().unwrap()),
            -scalar(&pos.mean().unwrap()),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_seed_reproducible_and_shape() {
        let d = JohnsonSU::<f64>::new(vec![1.0, 4.0], vec![2.0, 5.0], vec![3.0, 6.0], vec![11.0, 22.0],
            DistributionOptions::default()).unwrap();
        let a = d.sample(&[4, 3], Some(123)).unwrap();
        let b = d.sample(&[4, 3], Some(123)).unwrap();
        assert_eq!(a.shape(), &[4, 3, 2]);
        assert_eq!(a, b);
        let c = d.sample(&[4, 3], Some(124)).unwrap();
        assert_ne!(a, c);
        assert!(a.iter().all(|v| v.is_finite()));

        let single = d.sample(&[], Some(1)).unwrap();
        assert_eq!(single.shape(), &[2]);
    }

    #[test]
    fn test_dual_gradient_of_log_prob_matches_finite_difference() {
        let (x, g, d, l, s) = (0.7, -0.4, 1.3, 0.2, 1.8);
        let h = 1e-6;
        let f = |g: f64| logpdf(x, g, d, l, s);
        let fd = (f(g + h) - f(g - h)) / (2.0 * h);

        let dd = JohnsonSU::new(Dual::var(g), Dual::constant(d), Dual::constant(l), Dual::constant(s),
            DistributionOptions::default()).unwrap();
        let lp = dd.log_prob(Dual::constant(x)).unwrap();
        assert_relative_eq!(lp[[]].val, logpdf(x, g, d, l, s), epsilon = 1e-14);
        assert_relative_eq!(lp[[]].dot, fd, epsilon = 1e-7);
        // Analytic: d/dgamma = -(gamma + delta*asinh(y))
        let y: f64 = (x - l) / s;
        assert_relative_eq!(lp[[]].dot, -(g + d * y.asinh()), epsilon = 1e-12);
    }

    #[test]
    fn test_introspection() {
        let props = JohnsonSU::<f64>::parameter_properties();
        assert_eq!(props.map(|p| p.name), PARAMETER_NAMES);
        assert_eq!(props[1].constraint, Constraint::Positive);
        assert!(props.iter().all(|p| p.event_ndims == 0));

        let shapes = JohnsonSU::<f64>::param_shapes([5, 2]);
        assert_eq!(shapes.len(), 4);
        assert!(shapes.values().all(|s| s.dims() == [5, 2]));

        let d = dist(1.0, 2.0, 3.0, 4.0);
        assert_eq!(d.name(), DEFAULT_NAME);
        assert_eq!(d.reparameterization_type(), ReparameterizationType::FullyReparameterized);
        assert_eq!(d.event_shape(), StaticShape::scalar());
        assert!(d.event_shape_tensor().is_scalar());
        assert_eq!(d.is_scalar_event(), Some(true));
        assert_eq!(d.is_scalar_batch(), Some(true));
    }

    #[test]
    fn test_parameters_snapshot_roundtrip() {
        let opts = DistributionOptions::default().with_name("su").with_validate_args(true);
        let d = JohnsonSU::<f64>::new(vec![1.0, -1.0], 2.0, 0.5, vec![1.0, 3.0], opts).unwrap();
        let json = d.parameters().to_json().unwrap();
        let p = JohnsonSUParameters::from_json(&json).unwrap();
        assert_eq!(p.options.name, "su");
        let back = JohnsonSU::<f64>::from_parameters(&p).unwrap();
        assert_eq!(back.mean().unwrap(), d.mean().unwrap());

        let mut bad = p.clone();
        bad.delta.values.push(1.0);
        assert!(matches!(JohnsonSU::<f64>::from_parameters(&bad), Err(Error::Validation(_))));
    }
}
