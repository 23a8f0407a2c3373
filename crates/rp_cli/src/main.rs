// crates/rp_cli/src/main.rs
//
// Exit codes, typed error mapping, the validate-only short-circuit and the full
// run path (load → overrides → pipeline → canonical artifacts → renderings).

mod args;
mod logging;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Bad flags, config domains, schema or JSON shape.
    pub const VALIDATION: i32 = 2;
    /// The predictor failed or produced a non-finite score.
    pub const PREDICTOR: i32 = 3;
    /// Read/write/path/limits.
    pub const IO: i32 = 4;
    /// Nothing to report: cancelled, past the deadline, or zero counted trials.
    pub const INCOMPLETE: i32 = 5;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use args::{parse_and_validate as parse_cli, Args, CliError};
use rp_core::SimError;
use rp_io::{canonical_json, loader, IoError};
use rp_pipeline::{run_loaded, validate::validate_inputs, CancelToken, PipelineError, PipelineOutputs};
use rp_report::{build_model, render_html, render_report_json, render_text};
use thiserror::Error;

/// Central error type for CLI → exit-code mapping.
#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Cli(#[from] CliError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl From<SimError> for MainError {
    fn from(e: SimError) -> Self {
        MainError::Pipeline(PipelineError::Sim(e))
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("racesim: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    logging::init(args.verbose, args.quiet);

    let result = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match result {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("racesim: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// Map our typed errors to the exit-code table.
fn map_error(e: &MainError) -> i32 {
    match e {
        MainError::Cli(_) => exitcodes::VALIDATION,
        MainError::Io(io) => map_io(io),
        MainError::Pipeline(PipelineError::Io(io)) => map_io(io),
        MainError::Pipeline(PipelineError::Sim(sim)) => map_sim(sim),
    }
}

fn map_io(e: &IoError) -> i32 {
    match e {
        IoError::Json { .. } | IoError::Invalid(_) => exitcodes::VALIDATION,
        IoError::Path(_) | IoError::Limit { .. } => exitcodes::IO,
    }
}

fn map_sim(e: &SimError) -> i32 {
    match e {
        SimError::InvalidConfiguration(_) | SimError::SchemaMismatch(_) => exitcodes::VALIDATION,
        SimError::PredictorFailure { .. } => exitcodes::PREDICTOR,
        SimError::Cancelled { .. } | SimError::InsufficientData(_) => exitcodes::INCOMPLETE,
    }
}

fn load(args: &Args) -> Result<loader::LoadedInputs, MainError> {
    let mut loaded = loader::load_inputs(&args.features, &args.model, args.config.as_deref())?;
    args::apply_overrides(args, &mut loaded.config);
    Ok(loaded)
}

/// Validate-only path: load, then run every pre-trial check. No artifacts.
fn validate_only(args: &Args) -> Result<(), MainError> {
    let loaded = load(args)?;
    let v = validate_inputs(loaded.features.drivers.clone(), &loaded.model, &loaded.config)?;
    if !args.quiet {
        eprintln!(
            "validate-only: inputs OK ({} drivers, {} features)",
            v.table.len(),
            v.table.schema().len()
        );
    }
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let loaded = load(args)?;
    let outs = run_loaded(&loaded, &CancelToken::new())?;

    write_artifacts(&args.out, &outs)?;
    let table = maybe_render_reports(args, &outs)?;

    if !args.quiet {
        print!("{table}");
    }
    tracing::info!(out = %args.out.display(), id = %outs.report.id, "artifacts written");
    Ok(())
}

/// Canonical artifacts: report.json and run_record.json.
fn write_artifacts(out: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    fs::create_dir_all(out).map_err(|e| IoError::Path(format!("{}: {e}", out.display())))?;
    canonical_json::write_canonical_file(&out.join("report.json"), &outs.report)?;
    canonical_json::write_canonical_file(&out.join("run_record.json"), &outs.run_record)?;
    Ok(())
}

/// Optional renderings. Returns the text table for stdout.
fn maybe_render_reports(args: &Args, outs: &PipelineOutputs) -> Result<String, MainError> {
    let model = build_model(&outs.report, Some(&outs.run_record));
    let text = render_text(&model);
    for kind in &args.render {
        match kind.as_str() {
            "json" => {
                let v = render_report_json(&model);
                canonical_json::write_canonical_file(&args.out.join("report_view.json"), &v)?;
            }
            "html" => {
                let html = render_html(&model);
                canonical_json::write_atomic(&args.out.join("report.html"), html.as_bytes())
                    .map_err(IoError::from)?;
            }
            "text" => {
                canonical_json::write_atomic(&args.out.join("report.txt"), text.as_bytes())
                    .map_err(IoError::from)?;
            }
            // clap's value_parser restricts the set
            _ => {}
        }
    }
    Ok(text)
}
