// crates/rp_cli/src/args.rs
//
// Offline CLI argument surface: typed flags, seed parsing, local-path checks,
// and the mapping of flags onto a loaded `RunConfig`.
//
// Rules:
// - Inputs are local files only (any scheme:// is rejected before loading)
// - Flags override the config file; the config file overrides defaults
// - Seed accepts decimal u64 or 0x-hex (1..=16 hex digits)

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use rp_core::variables::{FailurePolicy, Imputation, RunConfig};
use thiserror::Error;

/// Parsed CLI arguments.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "racesim",
    disable_help_subcommand = true,
    about = "Monte Carlo race outcome simulator (offline, deterministic for a fixed seed)"
)]
pub struct Args {
    // --- Inputs ---
    /// Feature table JSON (one record per driver).
    #[arg(long)]
    pub features: PathBuf,
    /// Linear model JSON (`intercept` + `weights`).
    #[arg(long)]
    pub model: PathBuf,
    /// Run configuration JSON; defaults apply when omitted.
    #[arg(long)]
    pub config: Option<PathBuf>,

    // --- Run overrides ---
    /// Number of trials.
    #[arg(long)]
    pub trials: Option<u32>,
    /// Seed override. Accepts decimal u64 or 0x-hex (≤16 hex digits).
    #[arg(long, value_parser = parse_seed)]
    pub seed: Option<u64>,
    /// Worker threads (1 = sequential).
    #[arg(long)]
    pub workers: Option<usize>,
    /// Trials per work unit.
    #[arg(long)]
    pub batch_size: Option<u32>,
    /// Skip trials whose predictor call fails instead of aborting.
    #[arg(long)]
    pub skip_failed_trials: bool,
    /// Emit a partial report when the deadline is hit.
    #[arg(long)]
    pub accept_partial: bool,
    /// Fill null feature values with the per-feature median.
    #[arg(long)]
    pub impute_median: bool,
    /// Wall-clock cap for the trial loop, in milliseconds.
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    // --- Output & rendering ---
    /// Output directory (default: current directory).
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
    /// Extra renderings to write next to report.json.
    #[arg(long, value_parser = ["json", "html", "text"], num_args = 0..=3)]
    pub render: Vec<String>,

    // --- Control ---
    /// Load and validate inputs only; no trials, no artifacts.
    #[arg(long)]
    pub validate_only: bool,
    /// Do not print the summary table.
    #[arg(long)]
    pub quiet: bool,
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Errors surfaced by argument validation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("path must be a local file (no scheme): {0}")]
    NonLocalPath(String),
    #[error("--out exists and is not a directory: {0}")]
    OutNotDir(String),
}

/// Seed parser: decimal u64 or 0x-hex (1..=16 nybbles).
pub fn parse_seed(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty seed".into());
    }
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        if rest.is_empty() || rest.len() > 16 || !rest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("hex seed must be 1..16 hex digits".into());
        }
        u64::from_str_radix(rest, 16).map_err(|_| "hex seed out of range".into())
    } else {
        s.parse::<u64>().map_err(|_| "decimal seed must be a valid u64".into())
    }
}

#[inline]
fn has_scheme(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    lower.contains("://") || lower.starts_with("http:") || lower.starts_with("https:") || lower.starts_with("file:")
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if has_scheme(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        Some(args.features.as_path()),
        Some(args.model.as_path()),
        args.config.as_deref(),
        Some(args.out.as_path()),
    ]
    .into_iter()
    .flatten()
}

/// Scheme and `--out` checks on already-parsed arguments. Existence of input
/// files is left to the loader so a missing file reports as an I/O error.
pub fn validate(args: &Args) -> Result<(), CliError> {
    for p in iter_all_paths(args) {
        ensure_local_path(p)?;
    }
    if args.out.exists() && !args.out.is_dir() {
        return Err(CliError::OutNotDir(args.out.display().to_string()));
    }
    Ok(())
}

/// Entry point used by main.rs. Clap usage errors exit with code 2 on their own.
pub fn parse_and_validate() -> Result<Args, CliError> {
    let args = Args::parse();
    validate(&args)?;
    Ok(args)
}

/// Fold flag overrides into the loaded configuration.
pub fn apply_overrides(args: &Args, cfg: &mut RunConfig) {
    if let Some(n) = args.trials {
        cfg.trial_count = n;
    }
    if let Some(seed) = args.seed {
        cfg.random_seed = Some(seed);
    }
    if let Some(w) = args.workers {
        cfg.workers = Some(w);
    }
    if let Some(b) = args.batch_size {
        cfg.batch_size = b;
    }
    if args.skip_failed_trials {
        cfg.failure_policy = FailurePolicy::SkipAndCount;
    }
    if args.accept_partial {
        cfg.accept_partial = true;
    }
    if args.impute_median {
        cfg.imputation = Imputation::Median;
    }
    if let Some(ms) = args.deadline_ms {
        cfg.deadline_ms = Some(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["racesim", "--features", "f.json", "--model", "m.json"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn seed_decimal_and_hex() {
        assert_eq!(parse_seed("42"), Ok(42));
        assert_eq!(parse_seed("0x2A"), Ok(42));
        assert_eq!(parse_seed("0xFFFFFFFFFFFFFFFF"), Ok(u64::MAX));
        assert!(parse_seed("0x").is_err());
        assert!(parse_seed("0x1FFFFFFFFFFFFFFFF").is_err());
        assert!(parse_seed("-1").is_err());
        assert!(parse_seed("").is_err());
    }

    #[test]
    fn schemes_are_rejected() {
        let a = parse(&["--config", "https://example.org/c.json"]);
        assert!(matches!(validate(&a), Err(CliError::NonLocalPath(_))));
        let b = parse(&[]);
        assert!(validate(&b).is_ok());
    }

    #[test]
    fn overrides_replace_config_values() {
        let a = parse(&[
            "--trials",
            "250",
            "--seed",
            "0x10",
            "--workers",
            "2",
            "--batch-size",
            "8",
            "--skip-failed-trials",
            "--accept-partial",
            "--impute-median",
            "--deadline-ms",
            "500",
        ]);
        let mut cfg = RunConfig::default();
        apply_overrides(&a, &mut cfg);
        assert_eq!(cfg.trial_count, 250);
        assert_eq!(cfg.random_seed, Some(16));
        assert_eq!(cfg.workers, Some(2));
        assert_eq!(cfg.batch_size, 8);
        assert_eq!(cfg.failure_policy, FailurePolicy::SkipAndCount);
        assert!(cfg.accept_partial);
        assert_eq!(cfg.imputation, Imputation::Median);
        assert_eq!(cfg.deadline_ms, Some(500));
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let a = parse(&[]);
        let mut cfg = RunConfig { trial_count: 77, random_seed: Some(5), ..RunConfig::default() };
        let before = cfg.clone();
        apply_overrides(&a, &mut cfg);
        assert_eq!(cfg, before);
    }

    #[test]
    fn render_and_verbosity() {
        let a = parse(&["--render", "html", "text", "-vv"]);
        assert_eq!(a.render, vec!["html".to_string(), "text".to_string()]);
        assert_eq!(a.verbose, 2);
        assert!(Args::try_parse_from(["racesim", "--features", "f", "--model", "m", "--render", "pdf"]).is_err());
    }
}
