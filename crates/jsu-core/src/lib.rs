//! # jsu-core
//!
//! Shared foundations for the jsu crates:
//! - [`Error`] / [`Result`]: the error taxonomy every operation reports through
//! - [`shape`]: static and dynamic shape model with broadcasting rules
//! - [`types`]: distribution options, dtype tags and parameter constraints

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod shape;
pub mod types;

pub use error::{Error, Result};
pub use shape::{Shape, StaticShape};
pub use types::{Constraint, DType, DistributionOptions, ReparameterizationType};
