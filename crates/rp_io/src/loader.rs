//! Loader: read local JSON inputs (feature table, run configuration, linear
//! model), parse them into typed values and digest their canonical form for the
//! run record. No network I/O; validation of semantics happens in the pipeline.

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::Read;
use std::path::Path;

use rp_algo::predictor::LinearPredictor;
use rp_core::{features::DriverRecord, variables::RunConfig};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{hasher, looks_like_url_strict, IoError};

/// Upper bound on any single input file.
pub const MAX_INPUT_BYTES: u64 = 16 * 1024 * 1024;

// ----------------------------- Wire-facing types -----------------------------

/// Feature table file: optional race label plus one record per driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    pub drivers: Vec<DriverRecord>,
}

/// sha256 hex of each input's canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDigests {
    pub features_sha256: String,
    pub model_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_sha256: Option<String>,
}

/// Everything a run needs from disk.
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub features: FeatureFile,
    pub model: LinearPredictor,
    pub config: RunConfig,
    pub digests: InputDigests,
}

// ----------------------------- Orchestration -----------------------------

/// Load features + model (+ optional config; defaults otherwise).
pub fn load_inputs(features: &Path, model: &Path, config: Option<&Path>) -> Result<LoadedInputs, IoError> {
    let (features_v, features) = read_typed::<FeatureFile>(features)?;
    let (model_v, model) = read_typed::<LinearPredictor>(model)?;
    model
        .validate()
        .map_err(|e| IoError::Invalid(format!("model: {e}")))?;
    let (config, config_sha256) = match config {
        Some(p) => {
            let (v, cfg) = read_typed::<RunConfig>(p)?;
            (cfg, Some(hasher::sha256_canonical_value(&v)))
        }
        None => (RunConfig::default(), None),
    };
    Ok(LoadedInputs {
        features,
        model,
        config,
        digests: InputDigests {
            features_sha256: hasher::sha256_canonical_value(&features_v),
            model_sha256: hasher::sha256_canonical_value(&model_v),
            config_sha256,
        },
    })
}

// ----------------------------- Targeted loaders -----------------------------

pub fn load_feature_file(path: &Path) -> Result<FeatureFile, IoError> {
    read_typed(path).map(|(_, f)| f)
}

pub fn load_run_config(path: &Path) -> Result<RunConfig, IoError> {
    read_typed(path).map(|(_, c)| c)
}

pub fn load_linear_model(path: &Path) -> Result<LinearPredictor, IoError> {
    let (_, m) = read_typed::<LinearPredictor>(path)?;
    m.validate().map_err(|e| IoError::Invalid(format!("model: {e}")))?;
    Ok(m)
}

// ----------------------------- Internals -----------------------------

fn read_typed<T: DeserializeOwned>(path: &Path) -> Result<(Value, T), IoError> {
    let v = read_json_value_with_limits(path)?;
    let t = serde_json::from_value(v.clone()).map_err(|e| IoError::Json {
        file: path.display().to_string(),
        msg: e.to_string(),
    })?;
    Ok((v, t))
}

/// Read a JSON document, rejecting URLs and inputs above `MAX_INPUT_BYTES`.
pub fn read_json_value_with_limits(path: &Path) -> Result<Value, IoError> {
    let shown = path.display().to_string();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Invalid(format!("remote inputs are not supported: {shown}")));
    }
    let f = File::open(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    let mut buf = Vec::new();
    f.take(MAX_INPUT_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Limit { file: shown, limit: MAX_INPUT_BYTES });
    }
    serde_json::from_slice(&buf).map_err(|e| IoError::Json { file: shown, msg: e.to_string() })
}
