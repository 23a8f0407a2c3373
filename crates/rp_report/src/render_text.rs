//! Plain-text table for terminals.

use std::fmt::Write as _;

use crate::ReportModel;

pub fn render_text(m: &ReportModel) -> String {
    let mut out = String::new();
    let c = &m.cover;
    let _ = writeln!(out, "{}", c.title);
    let _ = writeln!(
        out,
        "status {} | seed {} | trials {}/{} (skipped {})",
        c.status, c.seed, c.trials_completed, c.trials_requested, c.trials_skipped
    );
    if !c.noise.is_empty() {
        let noise: Vec<String> = c.noise.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let _ = writeln!(out, "noise σ: {}", noise.join(", "));
    }
    out.push('\n');

    let team_w = m
        .rows
        .iter()
        .filter_map(|r| r.team.as_ref().map(|t| t.chars().count()))
        .max()
        .unwrap_or(0)
        .max(4);
    let _ = writeln!(
        out,
        "{:>3}  {:<8} {:<team_w$} {:>4} {:>7} {:>7} {:>5} {:>9} {:>4}",
        "#", "driver", "team", "grid", "win", "podium", "mean", "p5-p95", "base"
    );
    for r in &m.rows {
        let _ = writeln!(
            out,
            "{:>3}  {:<8} {:<team_w$} {:>4} {:>7} {:>7} {:>5} {:>9} {:>4}",
            r.rank,
            r.driver,
            r.team.as_deref().unwrap_or("-"),
            r.grid.map_or_else(|| "-".to_string(), |g| g.to_string()),
            r.win,
            r.podium,
            r.mean_position,
            r.range,
            r.baseline_rank.map_or_else(|| "-".to_string(), |b| b.to_string()),
        );
    }

    if !m.importance.is_empty() {
        out.push('\n');
        let imp: Vec<String> = m.importance.iter().map(|(k, v)| format!("{k} {v}")).collect();
        let _ = writeln!(out, "feature importance: {}", imp.join(", "));
    }
    let _ = writeln!(out, "\n{}", m.footer.report_id);
    out
}
