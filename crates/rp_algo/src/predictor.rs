//! Predictor capability consumed by the trial evaluator.
//!
//! Any scorer that maps a feature row to a finite number implements
//! `Predictor`. Lower scores finish ahead (the scores are predicted lap
//! times). Two implementations ship here: a linear model loadable from JSON
//! and a closure adapter.

use std::collections::BTreeMap;

use rp_core::features::{FeatureRow, FeatureSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("missing feature '{0}'")]
    MissingFeature(String),
    #[error("model error: {0}")]
    Model(String),
}

/// Scores one driver's (possibly perturbed) features. Must be safe to share
/// across worker threads.
pub trait Predictor: Sync {
    fn score(&self, row: FeatureRow<'_>) -> Result<f64, PredictError>;

    /// Score every row of one trial. The default scores row by row; vectorized
    /// models may override it but must return one result per row, in order.
    fn score_batch(&self, schema: &FeatureSchema, rows: &[Vec<f64>]) -> Vec<Result<f64, PredictError>> {
        rows.iter().map(|r| self.score(FeatureRow::new(schema, r))).collect()
    }

    /// Feature names the model reads. Checked against the table before any trial runs.
    fn required_features(&self) -> Vec<String> {
        Vec::new()
    }

    /// Relative importance per feature, if the model can report it.
    fn feature_importance(&self) -> Option<BTreeMap<String, f64>> {
        None
    }

    fn name(&self) -> &str {
        "predictor"
    }
}

impl<P: Predictor + ?Sized> Predictor for &P {
    fn score(&self, row: FeatureRow<'_>) -> Result<f64, PredictError> {
        (**self).score(row)
    }
    fn score_batch(&self, schema: &FeatureSchema, rows: &[Vec<f64>]) -> Vec<Result<f64, PredictError>> {
        (**self).score_batch(schema, rows)
    }
    fn required_features(&self) -> Vec<String> {
        (**self).required_features()
    }
    fn feature_importance(&self) -> Option<BTreeMap<String, f64>> {
        (**self).feature_importance()
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

/* -------------------------------------------------------------------------- */
/*                               Linear predictor                             */
/* -------------------------------------------------------------------------- */

/// `score = intercept + Σ weight[f] · x[f]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearPredictor {
    #[serde(default)]
    pub intercept: f64,
    pub weights: BTreeMap<String, f64>,
}

impl LinearPredictor {
    pub fn new(intercept: f64, weights: BTreeMap<String, f64>) -> Result<Self, PredictError> {
        let m = Self { intercept, weights };
        m.validate()?;
        Ok(m)
    }

    /// Coefficients must be finite and there must be at least one weight.
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.weights.is_empty() {
            return Err(PredictError::Model("linear model has no weights".into()));
        }
        if !self.intercept.is_finite() {
            return Err(PredictError::Model("intercept is not finite".into()));
        }
        if let Some((k, w)) = self.weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(PredictError::Model(format!("weight for '{k}' is not finite ({w})")));
        }
        Ok(())
    }
}

impl Predictor for LinearPredictor {
    fn score(&self, row: FeatureRow<'_>) -> Result<f64, PredictError> {
        let mut acc = self.intercept;
        for (name, w) in &self.weights {
            let x = row
                .get(name)
                .ok_or_else(|| PredictError::MissingFeature(name.clone()))?;
            acc += w * x;
        }
        Ok(acc)
    }

    fn required_features(&self) -> Vec<String> {
        self.weights.keys().cloned().collect()
    }

    /// Normalized absolute weights (sum to 1; all zero when every weight is zero).
    fn feature_importance(&self) -> Option<BTreeMap<String, f64>> {
        let total: f64 = self.weights.values().map(|w| w.abs()).sum();
        Some(
            self.weights
                .iter()
                .map(|(k, w)| {
                    let share = if total > 0.0 { w.abs() / total } else { 0.0 };
                    (k.clone(), share)
                })
                .collect(),
        )
    }

    fn name(&self) -> &str {
        "linear"
    }
}

/* -------------------------------------------------------------------------- */
/*                              Closure predictor                             */
/* -------------------------------------------------------------------------- */

/// Adapts a plain closure into a `Predictor`.
pub struct FnPredictor<F> {
    f: F,
    required: Vec<String>,
}

impl<F> FnPredictor<F>
where
    F: Fn(FeatureRow<'_>) -> Result<f64, PredictError> + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f, required: Vec::new() }
    }

    /// Declare the features the closure reads so they are validated up front.
    pub fn requiring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = names.into_iter().map(Into::into).collect();
        self
    }
}

impl<F> Predictor for FnPredictor<F>
where
    F: Fn(FeatureRow<'_>) -> Result<f64, PredictError> + Sync,
{
    fn score(&self, row: FeatureRow<'_>) -> Result<f64, PredictError> {
        (self.f)(row)
    }

    fn required_features(&self) -> Vec<String> {
        self.required.clone()
    }

    fn name(&self) -> &str {
        "closure"
    }
}
