//! Common data types for jsu

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Result;

/// Floating-point element type of a parameter array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "float32"),
            DType::F64 => write!(f, "float64"),
        }
    }
}

/// How gradients flow through samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReparameterizationType {
    /// Samples are a differentiable function of the parameters and a
    /// parameter-free noise source.
    FullyReparameterized,
    /// Samples carry no pathwise gradient.
    NotReparameterized,
}

/// Support constraint of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    /// Any real value.
    Real,
    /// Strictly positive.
    Positive,
}

impl Constraint {
    /// Whether `v` satisfies the constraint. NaN never does.
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        match self {
            Constraint::Real => !v.is_nan(),
            Constraint::Positive => v > 0.0,
        }
    }
}

/// Construction options shared by every distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionOptions {
    /// Check parameter constraints (slower). When `false`, invalid
    /// parameters silently produce NaN/Inf.
    pub validate_args: bool,

    /// When `false`, statistics with undefined (NaN) batch members are
    /// reported as errors instead of returned.
    pub allow_nan_stats: bool,

    /// Display name.
    pub name: String,
}

impl Default for DistributionOptions {
    fn default() -> Self {
        Self { validate_args: false, allow_nan_stats: true, name: String::new() }
    }
}

impl DistributionOptions {
    /// Options with the given name and default flags.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Set `validate_args`.
    pub fn with_validate_args(mut self, validate_args: bool) -> Self {
        self.validate_args = validate_args;
        self
    }

    /// Set `allow_nan_stats`.
    pub fn with_allow_nan_stats(mut self, allow_nan_stats: bool) -> Self {
        self.allow_nan_stats = allow_nan_stats;
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize options to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
