//! Run configuration: trial count, noise magnitudes, seed, and execution knobs.
//!
//! Notes:
//! - `random_seed == None` means "draw a seed from OS entropy"; the effective
//!   seed is echoed in the report so any run can be replayed.
//! - Noise entries are validated against the feature schema later, when the
//!   `NoiseModel` is built; this module only checks domains.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::SimError;

/// Default number of trials per simulation request.
pub const DEFAULT_TRIAL_COUNT: u32 = 1000;

/// Default number of trials handed to a worker at a time.
pub const DEFAULT_BATCH_SIZE: u32 = 64;

/// What to do when the predictor fails inside a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole run on the first failing trial.
    #[default]
    Abort,
    /// Drop the failing trial and count it in `trials_skipped`.
    SkipAndCount,
}

/// Treatment of features that are present with a `null` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Imputation {
    /// Missing values are a schema error.
    #[default]
    None,
    /// Replace with the median of the same feature across drivers.
    Median,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub trial_count: u32,
    /// Additive Gaussian standard deviation per feature name. Empty by default.
    pub noise_std_by_feature: BTreeMap<String, f64>,
    pub random_seed: Option<u64>,
    pub failure_policy: FailurePolicy,
    pub imputation: Imputation,
    /// Worker threads; `None` uses the pool default, `Some(1)` runs sequentially.
    pub workers: Option<usize>,
    pub batch_size: u32,
    /// Emit a report (status `partial`) when the run is cancelled or times out.
    pub accept_partial: bool,
    /// Wall-clock cap in milliseconds, checked between trials.
    pub deadline_ms: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trial_count: DEFAULT_TRIAL_COUNT,
            noise_std_by_feature: BTreeMap::new(),
            random_seed: None,
            failure_policy: FailurePolicy::Abort,
            imputation: Imputation::None,
            workers: None,
            batch_size: DEFAULT_BATCH_SIZE,
            accept_partial: false,
            deadline_ms: None,
        }
    }
}

impl RunConfig {
    /// Same configuration with every noise magnitude forced to zero.
    pub fn without_noise(mut self) -> Self {
        self.noise_std_by_feature.values_mut().for_each(|v| *v = 0.0);
        self
    }
}

/// Domain checks that do not need the feature schema.
pub fn validate_config(cfg: &RunConfig) -> Result<(), SimError> {
    if cfg.trial_count == 0 {
        return Err(SimError::config("trial_count must be >= 1"));
    }
    for (name, std) in &cfg.noise_std_by_feature {
        if !std.is_finite() {
            return Err(SimError::config(format!("noise std for '{name}' is not finite")));
        }
        if *std < 0.0 {
            return Err(SimError::config(format!("noise std for '{name}' is negative ({std})")));
        }
    }
    if cfg.batch_size == 0 {
        return Err(SimError::config("batch_size must be >= 1"));
    }
    if cfg.workers == Some(0) {
        return Err(SimError::config("workers must be >= 1 when set"));
    }
    if cfg.deadline_ms == Some(0) {
        return Err(SimError::config("deadline_ms must be >= 1 when set"));
    }
    Ok(())
}
