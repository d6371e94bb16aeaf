//! The `ldscreen scores` and `ldscreen recommend` commands.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use comfy_table::{Cell, Table};

use super::open_engine;

pub fn scores(config: Option<PathBuf>, user: String) -> Result<()> {
    let (_, engine) = open_engine(config)?;
    let scores = engine.area_scores(&user)?;

    let mut table = Table::new();
    table.set_header(vec!["Area", "Weakness"]);
    for s in &scores {
        table.add_row(vec![
            Cell::new(s.domain.label()),
            Cell::new(format!("{:.2}", s.weakness)),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn recommend(config: Option<PathBuf>, user: String) -> Result<()> {
    let (_, engine) = open_engine(config)?;
    let recommendations = engine.regenerate_recommendations(&user, Utc::now())?;

    if recommendations.is_empty() {
        println!("No recommendations at this time.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Area", "Title", "Score", "Resource"]);
    for r in &recommendations {
        table.add_row(vec![
            Cell::new(r.domain.label()),
            Cell::new(&r.title),
            Cell::new(format!("{:.2}", r.severity)),
            Cell::new(&r.resource_url),
        ]);
    }
    println!("{table}");
    Ok(())
}
