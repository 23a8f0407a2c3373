//! Error surface shared by every simulation stage.
//!
//! Configuration and schema problems are raised before the first trial runs;
//! predictor failures carry the trial and driver that produced them.

use thiserror::Error;

/// Failure kinds of a simulation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// Non-positive trial count, negative or non-finite noise magnitude, bad knob.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A driver record is missing a feature, or feature sets differ across drivers.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The predictor raised or returned a NaN/infinite score.
    #[error("predictor failure in trial {trial} for driver {driver}: {reason}")]
    PredictorFailure {
        trial: u64,
        driver: String,
        reason: String,
    },

    /// Nothing to summarize (zero counted trials).
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The run stopped early and the caller did not accept a partial report.
    #[error("run cancelled after {completed} of {requested} trials")]
    Cancelled { completed: u64, requested: u64 },
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        SimError::SchemaMismatch(msg.into())
    }
}
