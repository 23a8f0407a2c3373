// crates/rp_report/src/render_html.rs
//
// Deterministic, offline HTML renderer.
// • No external assets; inline CSS only.
// • Every content string is HTML-escaped.
// • Section order: Cover → Outcome table → Feature importance → Footer.

use std::fmt::Write as _;

use crate::ReportModel;

/// Escape text for HTML (minimal, deterministic).
fn esc(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

pub struct HtmlBuilder {
    buf: String,
}

impl HtmlBuilder {
    pub fn new() -> Self {
        Self { buf: String::with_capacity(16 * 1024) }
    }

    pub fn start(&mut self, title: &str) {
        let _ = write!(
            self.buf,
            "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
             <title>{}</title>\
             <style>\
             body{{font-family:system-ui,-apple-system,Segoe UI,Roboto,Ubuntu,Arial,sans-serif;margin:24px;}}\
             h1,h2,h3{{margin:0.2em 0;}}\
             .muted{{opacity:0.8}}\
             .pill{{display:inline-block;padding:.2em .6em;border-radius:9999px;background:#eee}}\
             table{{border-collapse:collapse}}\
             td,th{{padding:4px 8px;border-bottom:1px solid #ddd;text-align:left}}\
             td.num{{text-align:right;font-variant-numeric:tabular-nums}}\
             </style></head><body>",
            esc(title)
        );
    }

    pub fn finish(mut self) -> String {
        self.buf.push_str("</body></html>");
        self.buf
    }

    pub fn section_cover(&mut self, m: &ReportModel) {
        let c = &m.cover;
        let _ = write!(
            self.buf,
            "<h1>{}</h1><p><span class=\"pill\">{}</span> seed {} · {} of {} trials counted",
            esc(&c.title),
            esc(&c.status),
            c.seed,
            c.trials_completed,
            c.trials_requested
        );
        if c.trials_skipped > 0 {
            let _ = write!(self.buf, " · {} skipped", c.trials_skipped);
        }
        self.buf.push_str("</p>");
        if !c.noise.is_empty() {
            self.buf.push_str("<p class=\"muted\">Noise σ: ");
            for (i, (k, v)) in c.noise.iter().enumerate() {
                if i > 0 {
                    self.buf.push_str(", ");
                }
                let _ = write!(self.buf, "{} {}", esc(k), v);
            }
            self.buf.push_str("</p>");
        }
    }

    pub fn section_table(&mut self, m: &ReportModel) {
        self.buf.push_str(
            "<h3>Predicted outcome</h3><table><thead><tr>\
             <th>#</th><th>Driver</th><th>Team</th><th>Grid</th><th>Win</th>\
             <th>Podium</th><th>Mean pos.</th><th>P5–P95</th><th>Baseline</th>\
             </tr></thead><tbody>",
        );
        for r in &m.rows {
            let _ = write!(
                self.buf,
                "<tr><td class=\"num\">{}</td><td><b>{}</b></td><td>{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\">{}</td><td class=\"num\">{}</td></tr>",
                r.rank,
                esc(&r.driver),
                esc(r.team.as_deref().unwrap_or("")),
                r.grid.map(|g| g.to_string()).unwrap_or_default(),
                esc(&r.win),
                esc(&r.podium),
                esc(&r.mean_position),
                esc(&r.range),
                r.baseline_rank.map(|b| b.to_string()).unwrap_or_default(),
            );
        }
        self.buf.push_str("</tbody></table>");
    }

    pub fn section_importance(&mut self, m: &ReportModel) {
        if m.importance.is_empty() {
            return;
        }
        self.buf.push_str("<h3>Feature importance</h3><table><tbody>");
        for (k, v) in &m.importance {
            let _ = write!(self.buf, "<tr><td>{}</td><td class=\"num\">{}</td></tr>", esc(k), esc(v));
        }
        self.buf.push_str("</tbody></table>");
    }

    pub fn section_footer(&mut self, m: &ReportModel) {
        let f = &m.footer;
        let _ = write!(self.buf, "<hr><p class=\"muted\">Report {}", esc(&f.report_id));
        if let Some(e) = &f.engine {
            let _ = write!(self.buf, " · {}", esc(e));
        }
        self.buf.push_str("</p>");
        let digests = [
            ("features", &f.features_sha256),
            ("model", &f.model_sha256),
            ("config", &f.config_sha256),
        ];
        if digests.iter().any(|(_, d)| d.is_some()) {
            self.buf.push_str("<ul class=\"muted\">");
            for (k, d) in digests {
                if let Some(d) = d {
                    let _ = write!(self.buf, "<li>{k} sha256 <code>{}</code></li>", esc(d));
                }
            }
            self.buf.push_str("</ul>");
        }
    }
}

impl Default for HtmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Full document.
pub fn render_html(m: &ReportModel) -> String {
    let mut h = HtmlBuilder::new();
    h.start(&m.cover.title);
    h.section_cover(m);
    h.section_table(m);
    h.section_importance(m);
    h.section_footer(m);
    h.finish()
}
