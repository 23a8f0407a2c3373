// crates/rp_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Algorithm layer of the race simulator.
//!
//! Leaf-first: `noise` perturbs baseline features, `evaluate` turns one
//! trial's predictor scores into a finishing order, `accumulate` folds
//! finishing orders into per-driver statistics, and `summary` converts the
//! statistics into probabilities and percentile bounds.

pub mod accumulate;
pub mod evaluate;
pub mod noise;
pub mod percentile;
pub mod predictor;
pub mod summary;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use accumulate::{AccumulatedStats, DriverStats};
pub use evaluate::{evaluate, rank_scores, TrialRanking};
pub use noise::NoiseModel;
pub use percentile::{nearest_rank, PercentileRule, P_BEST, P_WORST};
pub use predictor::{FnPredictor, LinearPredictor, PredictError, Predictor};
pub use summary::{summarize, DriverSummary, PODIUM_POSITIONS};
