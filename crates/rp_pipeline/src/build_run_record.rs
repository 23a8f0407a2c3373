//! crates/rp_pipeline/src/build_run_record.rs
//!
//! Run record: provenance for one report (engine, effective configuration,
//! seed origin, input digests, output digest). The report id already pins the
//! outcome; the record explains how to reproduce it.

use rp_core::{ids::ReportId, variables::RunConfig};
use rp_io::{canonical_json::to_canonical_bytes, hasher, loader::InputDigests};
use serde::{Deserialize, Serialize};

use crate::{engine_identifiers, EngineMeta, PipelineError, RunStatus, SimulationReport};

/// Where the effective seed came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    Config,
    Entropy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialCounts {
    pub requested: u64,
    pub completed: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub report_id: ReportId,
    /// sha256 of the canonical report bytes (id included).
    pub report_sha256: String,
    pub engine: EngineMeta,
    pub status: RunStatus,
    pub seed: u64,
    pub seed_source: SeedSource,
    /// Configuration as executed (seed filled in).
    pub config: RunConfig,
    pub trials: TrialCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputDigests>,
}

pub fn build_run_record(
    report: &SimulationReport,
    cfg: &RunConfig,
    seed_source: SeedSource,
    inputs: Option<&InputDigests>,
) -> Result<RunRecord, PipelineError> {
    let report_sha256 = hasher::sha256_hex(&to_canonical_bytes(report)?);
    let body = &report.body;
    Ok(RunRecord {
        report_id: report.id.clone(),
        report_sha256,
        engine: engine_identifiers(),
        status: body.status,
        seed: body.seed,
        seed_source,
        config: RunConfig { random_seed: Some(body.seed), ..cfg.clone() },
        trials: TrialCounts {
            requested: body.trials_requested,
            completed: body.trials_completed,
            skipped: body.trials_skipped,
        },
        inputs: inputs.cloned(),
    })
}
