//! Probability building blocks for jsu.
//!
//! This crate hosts Johnson's SU distribution and what it is built from:
//! - the [`Distribution`] trait (shapes, sampling, densities, moments)
//! - [`JohnsonSU`], generic over the element [`Scalar`](jsu_ad::Scalar) so
//!   dual numbers flow through every operation
//! - parameter handles ([`Param`], [`Variable`]) re-read on every call
//! - reparameterized sample gradients on the reverse-mode tape ([`reparam`])
//! - small numeric helpers (stable `ln Φ`, `Φ⁻¹`, `ln(1 + x²)`)

pub mod any;
pub mod distribution;
pub mod johnson_su;
pub mod math;
pub mod param;
pub mod reparam;
pub mod seed;
pub mod tensor;

pub use any::{AnyJohnsonSU, AnyTensor};
pub use distribution::Distribution;
pub use johnson_su::{JohnsonSU, JohnsonSUParameters, ParameterProperties, ParameterValue};
pub use param::{Param, ShapePolicy, ValidationPolicy, Variable};
pub use reparam::{SampleGradients, TapeParams, TapeSample};
pub use seed::SeedStream;
pub use tensor::IntoArray;
