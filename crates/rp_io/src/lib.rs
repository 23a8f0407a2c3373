//! crates/rp_io/src/lib.rs
//! Local, offline I/O for the simulator.
//!
//! - `loader`: feature table, run configuration and linear model files
//! - `canonical_json`: sorted-key compact JSON and atomic file writes
//! - `hasher`: SHA-256 digests and `SIM:` report ids
//!
//! Shared error type (`IoError`) with `From` conversions used across modules.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for rp_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, read, create_dir_all, rename, ...).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON parse or shape errors, with the file they came from.
    #[error("json error in {file}: {msg}")]
    Json { file: String, msg: String },

    /// Input exceeded the read limit.
    #[error("{file} exceeds the {limit}-byte input limit")]
    Limit { file: String, limit: u64 },

    /// Generic validation / invariants (URLs, bad model coefficients, ...).
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        IoError::Json { file: "<memory>".to_string(), msg: e.to_string() }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{report_id_from_canonical, sha256_canonical, sha256_hex};
    pub use crate::loader::{load_inputs, FeatureFile, InputDigests, LoadedInputs};
}
