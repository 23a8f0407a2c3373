//! rp_report: presentation model over a finished Simulation Report.
//!
//! Renderers read the report (and optionally its run record) only; nothing is
//! recomputed. Numbers are formatted here once so every renderer agrees.

#![forbid(unsafe_code)]

use rp_pipeline::{RunRecord, RunStatus, SimulationReport};
use serde::{Deserialize, Serialize};

pub mod render_html;
pub mod render_json;
pub mod render_text;

pub use render_html::render_html;
pub use render_json::render_report_json;
pub use render_text::render_text;

/// Header block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverBlock {
    pub title: String,
    pub status: String,
    pub seed: u64,
    pub trials_requested: u64,
    pub trials_completed: u64,
    pub trials_skipped: u64,
    pub noise: Vec<(String, f64)>,
}

/// One table row, in predicted finishing order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverRow {
    pub rank: u32,
    pub driver: String,
    pub team: Option<String>,
    pub grid: Option<u16>,
    pub win: String,
    pub podium: String,
    pub mean_position: String,
    pub range: String,
    pub baseline_rank: Option<u32>,
}

/// Footer ids/digests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterIntegrity {
    pub report_id: String,
    pub engine: Option<String>,
    pub features_sha256: Option<String>,
    pub model_sha256: Option<String>,
    pub config_sha256: Option<String>,
}

/// Top-level report model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportModel {
    pub cover: CoverBlock,
    pub rows: Vec<DriverRow>,
    /// Feature importance, largest first (ties by name).
    pub importance: Vec<(String, String)>,
    pub footer: FooterIntegrity,
}

/// Percent with one decimal: `0.4567 -> "45.7%"`.
pub fn fmt_pct(x: f64) -> String {
    format!("{:.1}%", x * 100.0)
}

/// Position with one decimal.
pub fn fmt_pos(x: f64) -> String {
    format!("{x:.1}")
}

/// Map a report (+ optional run record) into the presentation model.
pub fn build_model(report: &SimulationReport, run: Option<&RunRecord>) -> ReportModel {
    let b = &report.body;
    let title = match &b.race {
        Some(r) => format!("Race outcome forecast: {r}"),
        None => "Race outcome forecast".to_string(),
    };
    let cover = CoverBlock {
        title,
        status: match b.status {
            RunStatus::Complete => "complete".into(),
            RunStatus::Partial => "partial".into(),
        },
        seed: b.seed,
        trials_requested: b.trials_requested,
        trials_completed: b.trials_completed,
        trials_skipped: b.trials_skipped,
        noise: b.noise_std_by_feature.iter().map(|(k, v)| (k.clone(), *v)).collect(),
    };

    let rows = b
        .predicted_order
        .iter()
        .enumerate()
        .filter_map(|(i, id)| {
            let d = b.drivers.get(id)?;
            Some(DriverRow {
                rank: i as u32 + 1,
                driver: id.to_string(),
                team: d.team.clone(),
                grid: d.grid,
                win: fmt_pct(d.win_pct),
                podium: fmt_pct(d.podium_pct),
                mean_position: fmt_pos(d.mean_position),
                range: format!("{}-{}", fmt_pos(d.p5_position), fmt_pos(d.p95_position)),
                baseline_rank: d.baseline_rank,
            })
        })
        .collect();

    let mut imp: Vec<(String, f64)> = b
        .feature_importance
        .iter()
        .flatten()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    imp.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    let importance = imp.into_iter().map(|(k, v)| (k, fmt_pct(v))).collect();

    let footer = FooterIntegrity {
        report_id: report.id.to_string(),
        engine: run.map(|r| format!("{} {} ({})", r.engine.name, r.engine.version, r.engine.build)),
        features_sha256: run.and_then(|r| r.inputs.as_ref()).map(|i| i.features_sha256.clone()),
        model_sha256: run.and_then(|r| r.inputs.as_ref()).map(|i| i.model_sha256.clone()),
        config_sha256: run.and_then(|r| r.inputs.as_ref()).and_then(|i| i.config_sha256.clone()),
    };

    ReportModel { cover, rows, importance, footer }
}
