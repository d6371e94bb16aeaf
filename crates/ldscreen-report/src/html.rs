//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use ldscreen_core::aggregate::AreaScore;
use ldscreen_core::report::{AttemptSummary, ScreeningReport, TestSection};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate an HTML report from a screening report.
pub fn generate_html(report: &ScreeningReport) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>LD Screening - {}</title>\n",
        html_escape(&report.user_id)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>LD Screening - Student Report</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Generated on {} | User: <strong>{}</strong></p>\n",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        html_escape(&report.user_id)
    ));
    html.push_str("</header>\n");

    html.push_str(&profile_section(report));
    html.push_str(&prediction_section(report));

    html.push_str("<section class=\"areas\">\n<h2>Area Scores</h2>\n");
    html.push_str(&generate_bar_chart(&report.area_scores));
    html.push_str("</section>\n");

    for section in &report.sections {
        html.push_str(&test_section(section));
    }

    html.push_str(&recommendation_section(report));

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<footer><p class=\"meta\">This report is a screening aid, not a diagnosis.</p></footer>\n");
    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &ScreeningReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn profile_section(report: &ScreeningReport) -> String {
    let mut html = String::from("<section class=\"profile\">\n<h2>Profile</h2>\n");
    let Some(p) = &report.profile else {
        html.push_str("<p>No intake recorded.</p>\n</section>\n");
        return html;
    };

    let gender = p.gender.map(|g| g.to_string()).unwrap_or_else(|| "-".into());
    let rows = [
        ("Age", p.age.to_string()),
        ("Gender", gender),
        (
            "Reading difficulties",
            if p.reading_difficulties { "Yes" } else { "No" }.to_string(),
        ),
        ("Attention", p.attention_span.to_string()),
        ("Academic history", p.academic_history.clone()),
        ("Notes", p.learning_issues_notes.clone()),
    ];
    html.push_str("<table class=\"kv\">\n<tbody>\n");
    for (field, value) in rows {
        html.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>\n",
            field,
            html_escape(&value)
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");
    html
}

fn prediction_section(report: &ScreeningReport) -> String {
    let mut html = String::from("<section class=\"prediction\">\n<h2>Model Prediction</h2>\n");
    match &report.prediction {
        Some(pred) => {
            let class = if pred.label.is_positive() { "fail" } else { "pass" };
            html.push_str(&format!(
                "<p class=\"{}\">Label: <strong>{}</strong></p>\n<p>Probability (LD): {:.2}</p>\n<p class=\"meta\">Model: {}</p>\n",
                class,
                pred.label,
                pred.probability,
                html_escape(&pred.model_identifier)
            ));
        }
        None => html.push_str("<p>No prediction available.</p>\n"),
    }
    html.push_str("</section>\n");
    html
}

fn test_section(section: &TestSection) -> String {
    let mut html = format!(
        "<section class=\"test\">\n<h2>{} Test</h2>\n",
        section.domain.label()
    );
    let Some(latest) = &section.latest else {
        html.push_str("<p>No attempts recorded.</p>\n</section>\n");
        return html;
    };

    if let Some(reading) = &latest.reading {
        html.push_str(&format!(
            "<p>WPM: {:.1} | Accuracy: {:.2}</p>\n<blockquote>{}</blockquote>\n",
            reading.words_per_minute,
            reading.token_overlap_accuracy,
            html_escape(&reading.reference_text)
        ));
        html.push_str("</section>\n");
        return html;
    }

    html.push_str(&summary_line(latest));
    if !latest.rows.is_empty() {
        let show_item = latest.rows.iter().any(|r| !r.item.is_empty());
        html.push_str("<table class=\"details\">\n<thead><tr><th>#</th>");
        if show_item {
            html.push_str("<th>Item</th>");
        }
        html.push_str("<th>Your answer</th><th>Correct</th><th>Result</th></tr></thead>\n<tbody>\n");
        for row in &latest.rows {
            let class = if row.is_correct { "pass" } else { "fail" };
            html.push_str(&format!("<tr class=\"{}\"><td>{}</td>", class, row.position));
            if show_item {
                html.push_str(&format!("<td>{}</td>", html_escape(&row.item)));
            }
            html.push_str(&format!(
                "<td>{}</td><td>{}</td><td>{}</td></tr>\n",
                html_escape(&row.given),
                html_escape(&row.expected),
                if row.is_correct { "&#10003;" } else { "&#10007;" }
            ));
        }
        html.push_str("</tbody></table>\n");
    }
    html.push_str("</section>\n");
    html
}

fn summary_line(latest: &AttemptSummary) -> String {
    let score = match (latest.correct_count, latest.total_count) {
        (Some(c), Some(t)) => format!("Score: {c} / {t} | "),
        _ => String::new(),
    };
    format!(
        "<p>{}Duration: {} seconds | Taken {}</p>\n",
        score,
        latest.duration_seconds,
        latest.started_at.format("%Y-%m-%d %H:%M")
    )
}

fn recommendation_section(report: &ScreeningReport) -> String {
    let mut html = String::from("<section class=\"recommendations\">\n<h2>Recommendations</h2>\n");
    if report.recommendations.is_empty() {
        html.push_str("<p>No recommendations at this time.</p>\n</section>\n");
        return html;
    }
    html.push_str("<table class=\"summary\">\n<thead><tr><th>Area</th><th>Recommendation</th><th>Score</th></tr></thead>\n<tbody>\n");
    for r in &report.recommendations {
        html.push_str(&format!(
            "<tr><td>{}</td><td><strong>{}</strong><br>{}<br><a href=\"{}\">{}</a></td><td>{:.2}</td></tr>\n",
            r.domain.label(),
            html_escape(&r.title),
            html_escape(&r.description),
            html_escape(&r.resource_url),
            html_escape(&r.resource_url),
            r.severity
        ));
    }
    html.push_str("</tbody></table>\n</section>\n");
    html
}

fn generate_bar_chart(scores: &[AreaScore]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 160;

    let total_height = scores.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, area) in scores.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let weakness = area.weakness.clamp(0.0, 1.0);
        let width = (weakness * max_width as f64) as usize;

        // Higher weakness is worse.
        let color = if weakness <= 0.2 {
            "#22c55e"
        } else if weakness <= 0.5 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            area.domain.label()
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{:.2}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            area.weakness
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
table.kv th { width: 14rem; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
blockquote { margin: 1rem 0; padding: 0.5rem 1rem; border-left: 4px solid var(--border); }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;
