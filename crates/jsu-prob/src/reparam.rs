//! Pathwise gradients of samples on the reverse-mode tape.
//!
//! [`JohnsonSU::sample_n`] already differentiates through dual numbers when
//! `T` is [`Dual`](jsu_ad::Dual); that costs one pass per parameter
//! direction. Recording the draws on a [`Tape`] instead yields the gradient of
//! a scalar loss with respect to every parameter element in one backward
//! sweep. The standard-normal noise is identical to what `sample_n` draws for
//! the same seed.

use jsu_ad::{Scalar, Tape, Var};
use jsu_core::Result;
use ndarray::{ArrayD, Zip};

use crate::johnson_su::JohnsonSU;
use crate::tensor::{broadcast_to, shape_of};

/// Parameter leaves recorded on a tape, one [`Var`] per element, in the
/// parameters' own (unbroadcast) shapes.
#[derive(Debug, Clone)]
pub struct TapeParams {
    /// `gamma` leaves.
    pub gamma: ArrayD<Var>,
    /// `delta` leaves.
    pub delta: ArrayD<Var>,
    /// `loc` leaves.
    pub loc: ArrayD<Var>,
    /// `scale` leaves.
    pub scale: ArrayD<Var>,
}

/// Draws recorded on a tape together with the parameter leaves they depend on.
#[derive(Debug, Clone)]
pub struct TapeSample {
    /// Parameter leaves.
    pub params: TapeParams,
    /// Draws, shape `[n] + batch_shape`.
    pub draws: ArrayD<Var>,
}

/// Value of a loss over samples and its gradient per parameter element.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGradients {
    /// Loss value.
    pub value: f64,
    /// `∂loss/∂gamma`.
    pub gamma: ArrayD<f64>,
    /// `∂loss/∂delta`.
    pub delta: ArrayD<f64>,
    /// `∂loss/∂loc`.
    pub loc: ArrayD<f64>,
    /// `∂loss/∂scale`.
    pub scale: ArrayD<f64>,
}

impl<T: Scalar> JohnsonSU<T> {
    /// Record `n` draws per batch member on `tape`.
    pub fn sample_on_tape(&self, tape: &mut Tape, n: usize, seed: Option<u64>) -> Result<TapeSample> {
        let r = self.resolve()?;
        let mut leaves = |a: &ArrayD<T>| a.mapv(|v| tape.var(v.value()));
        let params = TapeParams {
            gamma: leaves(&r.gamma),
            delta: leaves(&r.delta),
            loc: leaves(&r.loc),
            scale: leaves(&r.scale),
        };

        let z = Self::standard_normal_draws(n, &r.batch, seed);
        let shape = shape_of(&z);
        let g = broadcast_to(&params.gamma, &shape, "gamma")?;
        let d = broadcast_to(&params.delta, &shape, "delta")?;
        let l = broadcast_to(&params.loc, &shape, "loc")?;
        let s = broadcast_to(&params.scale, &shape, "scale")?;

        let draws = Zip::from(&z).and(g).and(d).and(l).and(s).map_collect(|&z, &g, &d, &l, &s| {
            let t = tape.f64_sub(z, g);
            let t = tape.div(t, d);
            let t = tape.sinh(t);
            let t = tape.mul(s, t);
            tape.add(t, l)
        });
        Ok(TapeSample { params, draws })
    }

    /// Draw `n` samples per batch member, reduce them with `loss` and return
    /// the loss value with its gradient per parameter element.
    ///
    /// # Example
    /// ```
    /// use jsu_core::DistributionOptions;
    /// use jsu_prob::JohnsonSU;
    ///
    /// let dist = JohnsonSU::<f64>::new(1.0, 2.0, 0.0, 1.0, DistributionOptions::default()).unwrap();
    /// let grads = dist
    ///     .sample_gradients(16, Some(0), |tape, draws| {
    ///         let xs: Vec<_> = draws.iter().copied().collect();
    ///         tape.sum(&xs)
    ///     })
    ///     .unwrap();
    /// // d/dloc of a sum of 16 draws.
    /// assert_eq!(grads.loc[[]], 16.0);
    /// ```
    pub fn sample_gradients<F>(&self, n: usize, seed: Option<u64>, loss: F) -> Result<SampleGradients>
    where
        F: FnOnce(&mut Tape, &ArrayD<Var>) -> Var,
    {
        let mut tape = Tape::new();
        let sample = self.sample_on_tape(&mut tape, n, seed)?;
        let out = loss(&mut tape, &sample.draws);
        tape.backward(out);
        let adjoints = |a: &ArrayD<Var>| a.mapv(|v| tape.adjoint(v));
        Ok(SampleGradients {
            value: tape.val(out),
            gamma: adjoints(&sample.params.gamma),
            delta: adjoints(&sample.params.delta),
            loc: adjoints(&sample.params.loc),
            scale: adjoints(&sample.params.scale),
        })
    }
}
