//! The `ldscreen report` command.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use ldscreen_report::write_html_report;

use super::open_engine;

pub fn execute(
    config: Option<PathBuf>,
    user: String,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let (config, engine) = open_engine(config)?;
    let report = engine.compile_report(&user, Utc::now())?;

    let output = output.unwrap_or(config.output_dir);
    std::fs::create_dir_all(&output)?;
    let stem = format!(
        "{}-{}",
        sanitize(&user),
        report.generated_at.format("%Y-%m-%dT%H%M%S")
    );

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html", "markdown"]
    } else {
        format.split(',').collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{stem}.json"));
                report.save_json(&path)?;
                println!("JSON report: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{stem}.html"));
                write_html_report(&report, &path)?;
                println!("HTML report: {}", path.display());
            }
            "markdown" | "md" => {
                let path = output.join(format!("{stem}.md"));
                std::fs::write(&path, report.to_markdown())?;
                println!("Markdown report: {}", path.display());
            }
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

/// Keep user ids safe to use in file names.
fn sanitize(user: &str) -> String {
    user.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
