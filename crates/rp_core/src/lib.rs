//! rp_core: Core types, domains, ordering helpers, and deterministic RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared across the
//! simulator (`rp_io`, `rp_algo`, `rp_pipeline`, `rp_report`, `rp_cli`).
//!
//! - Identifiers: `DriverId` (registry token), `ReportId` (`SIM:` + 64-hex)
//! - Feature schema, per-driver records and the validated `FeatureTable`
//! - Run configuration (`RunConfig`) and its domain checks
//! - Stable ordering and order-independent reduction helpers
//! - Seedable RNG (ChaCha20) keyed per `(seed, driver)` with one stream per trial

#![forbid(unsafe_code)]

pub mod determinism;
pub mod errors;
pub mod features;
pub mod ids;
pub mod rng;
pub mod variables;

pub use errors::{SimError, SimResult};
pub use features::{DriverFeatureRecord, DriverRecord, FeatureRow, FeatureSchema, FeatureTable};
pub use ids::{DriverId, ReportId};
pub use variables::{FailurePolicy, Imputation, RunConfig};
