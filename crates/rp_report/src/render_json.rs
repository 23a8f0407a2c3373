//! render_json.rs: report JSON renderer.
//!
//! The machine-readable artifact is the Simulation Report itself; this module
//! adds the presentation model as a second, display-oriented document.
//! Callers write either through `rp_io::canonical_json` so key order is canonical.

use serde_json::{Map as JsonMap, Value};

use crate::ReportModel;

/// Display document: cover → table → importance → footer.
pub fn render_report_json(m: &ReportModel) -> Value {
    let mut root = JsonMap::new();

    let c = &m.cover;
    let mut cover = JsonMap::new();
    cover.insert("title".into(), Value::from(c.title.clone()));
    cover.insert("status".into(), Value::from(c.status.clone()));
    cover.insert("seed".into(), Value::from(c.seed));
    cover.insert("trials_requested".into(), Value::from(c.trials_requested));
    cover.insert("trials_completed".into(), Value::from(c.trials_completed));
    cover.insert("trials_skipped".into(), Value::from(c.trials_skipped));
    let noise: JsonMap<String, Value> = c.noise.iter().map(|(k, v)| (k.clone(), Value::from(*v))).collect();
    cover.insert("noise_std_by_feature".into(), Value::Object(noise));
    root.insert("cover".into(), Value::Object(cover));

    let rows = m
        .rows
        .iter()
        .map(|r| {
            let mut o = JsonMap::new();
            o.insert("rank".into(), Value::from(r.rank));
            o.insert("driver".into(), Value::from(r.driver.clone()));
            if let Some(team) = &r.team {
                o.insert("team".into(), Value::from(team.clone()));
            }
            if let Some(g) = r.grid {
                o.insert("grid".into(), Value::from(g));
            }
            o.insert("win".into(), Value::from(r.win.clone()));
            o.insert("podium".into(), Value::from(r.podium.clone()));
            o.insert("mean_position".into(), Value::from(r.mean_position.clone()));
            o.insert("p5_p95".into(), Value::from(r.range.clone()));
            if let Some(b) = r.baseline_rank {
                o.insert("baseline_rank".into(), Value::from(b));
            }
            Value::Object(o)
        })
        .collect();
    root.insert("table".into(), Value::Array(rows));

    if !m.importance.is_empty() {
        let imp = m
            .importance
            .iter()
            .map(|(k, v)| serde_json::json!({ "feature": k, "share": v }))
            .collect();
        root.insert("feature_importance".into(), Value::Array(imp));
    }

    let f = &m.footer;
    let mut footer = JsonMap::new();
    footer.insert("report_id".into(), Value::from(f.report_id.clone()));
    for (k, v) in [
        ("engine", &f.engine),
        ("features_sha256", &f.features_sha256),
        ("model_sha256", &f.model_sha256),
        ("config_sha256", &f.config_sha256),
    ] {
        if let Some(v) = v {
            footer.insert(k.into(), Value::from(v.clone()));
        }
    }
    root.insert("footer".into(), Value::Object(footer));

    Value::Object(root)
}
