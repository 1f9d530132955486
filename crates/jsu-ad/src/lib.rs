//! # jsu-ad
//!
//! Automatic differentiation (AD) primitives for jsu.
//!
//! Provides:
//! - **Forward-mode AD** via [`dual::Dual`] / [`dual32::Dual32`] numbers (efficient for few parameters)
//! - **Reverse-mode AD** via a computation [`tape::Tape`] (all gradients in one backward sweep)
//! - [`Scalar`](scalar::Scalar) trait for writing generic code over `f64`, `f32` and the dual types

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dual;
pub mod dual32;
pub mod scalar;
pub mod tape;

pub use dual::Dual;
pub use dual32::Dual32;
pub use scalar::Scalar;
pub use tape::{Tape, Var};
