//! Error kinds reported by the overlay engine.
//!
//! The engine (`color`, `sun_cycle`, `overlay::policy`) never logs or retries;
//! it reports one of these and lets the caller decide. Application layers wrap
//! them in `anyhow::Error` with context.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A sunrise/sunset string did not match `hh:mm:ss AM/PM`.
    #[error("invalid time format '{input}': expected hh:mm:ss AM/PM")]
    InvalidTimeFormat { input: String },

    /// Both blend weights were zero (or their sum was not positive).
    #[error("cannot blend colors with weights {weight_a} and {weight_b}")]
    DegenerateWeights { weight_a: f64, weight_b: f64 },
}

pub type EngineResult<T> = Result<T, EngineError>;
