//! rp_pipeline: deterministic simulation surface (validate → run → summarize → build).
//! This crate stays I/O-free and delegates JSON/hashing to `rp_io` and math to `rp_algo`.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use rp_algo::{percentile::PercentileRule, predictor::Predictor};
use rp_core::{
    errors::SimError,
    features::DriverRecord,
    ids::{DriverId, ReportId},
    rng::entropy_seed,
    variables::RunConfig,
};
use rp_io::{loader::LoadedInputs, IoError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod build_report;
pub mod build_run_record;
pub mod cancel;
pub mod run;
pub mod validate;

pub use build_run_record::{build_run_record, RunRecord, SeedSource};
pub use cancel::CancelToken;

/// Engine identifiers echoed in run records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

/// Engine identifiers for use in run records.
pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "racesim".to_string(),
        name: "rp_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: if cfg!(debug_assertions) { "dev" } else { "release" }.to_string(),
    }
}

/// Single error surface for orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Io(#[from] IoError),
}

impl PipelineError {
    pub fn as_sim(&self) -> Option<&SimError> {
        match self {
            PipelineError::Sim(e) => Some(e),
            PipelineError::Io(_) => None,
        }
    }
}

// ---------------------------- Report documents ----------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Partial,
}

/// Per-driver outcome distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid: Option<u16>,
    pub win_pct: f64,
    pub podium_pct: f64,
    pub mean_position: f64,
    pub position_std: f64,
    pub p5_position: f64,
    pub p95_position: f64,
    /// Observed nearest-rank percentiles before widening around the mean.
    pub p5_nearest_rank: u32,
    pub p95_nearest_rank: u32,
    /// Unperturbed predictor score (absent if the predictor failed on the baseline).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_rank: Option<u32>,
}

/// Everything in the report except its id; the id hashes this body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    pub status: RunStatus,
    pub seed: u64,
    pub trials_requested: u64,
    pub trials_completed: u64,
    pub trials_skipped: u64,
    pub percentile_rule: PercentileRule,
    /// Active noise magnitudes (zero entries omitted).
    pub noise_std_by_feature: BTreeMap<String, f64>,
    pub drivers: BTreeMap<DriverId, DriverOutcome>,
    /// Drivers by mean finishing position (ties in grid order).
    pub predicted_order: Vec<DriverId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_importance: Option<BTreeMap<String, f64>>,
}

/// Simulation Report: `SIM:` id plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub id: ReportId,
    #[serde(flatten)]
    pub body: ReportBody,
}

/// Report plus its run record.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub report: SimulationReport,
    pub run_record: RunRecord,
}

// -------------------------------------- Public API --------------------------------------

/// Run one simulation request with a fresh cancellation token.
pub fn simulate<P>(records: Vec<DriverRecord>, predictor: &P, cfg: &RunConfig) -> Result<SimulationReport, PipelineError>
where
    P: Predictor + ?Sized,
{
    simulate_with(None, records, predictor, cfg, &CancelToken::new())
}

/// Run one simulation request.
///
/// Validation errors surface before the predictor is called. An incomplete run
/// (cancelled or past its deadline) yields `Cancelled` unless
/// `cfg.accept_partial` is set.
pub fn simulate_with<P>(
    race: Option<&str>,
    records: Vec<DriverRecord>,
    predictor: &P,
    cfg: &RunConfig,
    cancel: &CancelToken,
) -> Result<SimulationReport, PipelineError>
where
    P: Predictor + ?Sized,
{
    let v = validate::validate_inputs(records, predictor, cfg)?;
    let seed = cfg.random_seed.unwrap_or_else(entropy_seed);
    let span = tracing::info_span!("simulate", race = race.unwrap_or("-"), seed, trials = cfg.trial_count);
    let _g = span.enter();
    tracing::info!(drivers = v.table.len(), features = v.table.schema().len(), "inputs validated");

    let opts = run::RunOptions {
        seed,
        trial_count: u64::from(cfg.trial_count),
        batch_size: u64::from(cfg.batch_size),
        failure_policy: cfg.failure_policy,
        workers: cfg.workers,
    };
    let stop = cancel::StopSignal::new(cancel.clone(), cfg.deadline_ms);
    let outcome = run::run_trials(&v.table, predictor, &v.noise, &opts, &stop)?;

    let completed = outcome.stats.trials_completed();
    if outcome.cancelled && !cfg.accept_partial {
        tracing::warn!(completed, requested = outcome.trials_requested, "run stopped early");
        return Err(SimError::Cancelled { completed, requested: outcome.trials_requested }.into());
    }
    if completed == 0 {
        return Err(SimError::InsufficientData(format!(
            "0 of {} trials counted ({} skipped)",
            outcome.trials_requested,
            outcome.stats.trials_skipped()
        ))
        .into());
    }

    let report = build_report::build_report(race, &v, predictor, &outcome, seed)?;
    tracing::info!(
        id = %report.id,
        completed,
        skipped = report.body.trials_skipped,
        status = ?report.body.status,
        "simulation finished"
    );
    Ok(report)
}

/// Convenience entry: inputs loaded by `rp_io` (linear model), report + run record.
pub fn run_loaded(loaded: &LoadedInputs, cancel: &CancelToken) -> Result<PipelineOutputs, PipelineError> {
    let (cfg, seed_source) = match loaded.config.random_seed {
        Some(_) => (loaded.config.clone(), SeedSource::Config),
        None => (
            RunConfig { random_seed: Some(entropy_seed()), ..loaded.config.clone() },
            SeedSource::Entropy,
        ),
    };
    let report = simulate_with(
        loaded.features.race.as_deref(),
        loaded.features.drivers.clone(),
        &loaded.model,
        &cfg,
        cancel,
    )?;
    let run_record = build_run_record(&report, &cfg, seed_source, Some(&loaded.digests))?;
    Ok(PipelineOutputs { report, run_record })
}
