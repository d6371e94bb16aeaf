//! The `ldscreen init` command.

use std::path::Path;

use anyhow::Result;

use ldscreen_core::classifier::ModelArtifact;

pub fn execute() -> Result<()> {
    // Create ldscreen.toml
    if Path::new("ldscreen.toml").exists() {
        println!("ldscreen.toml already exists, skipping.");
    } else {
        std::fs::write("ldscreen.toml", SAMPLE_CONFIG)?;
        println!("Created ldscreen.toml");
    }

    // Create starter item bank
    std::fs::create_dir_all("item-banks")?;
    let bank_path = Path::new("item-banks/starter.toml");
    if bank_path.exists() {
        println!("item-banks/starter.toml already exists, skipping.");
    } else {
        std::fs::write(bank_path, STARTER_BANK)?;
        println!("Created item-banks/starter.toml");
    }

    // Create baseline model
    let model_path = Path::new("models/ld_model.json");
    if model_path.exists() {
        println!("models/ld_model.json already exists, skipping.");
    } else {
        ModelArtifact::baseline().write(model_path)?;
        println!("Created models/ld_model.json (baseline)");
    }

    println!("\nNext steps:");
    println!("  1. Run: ldscreen validate --item-bank item-banks/starter.toml");
    println!("  2. Run: ldscreen start --user <id> --item-bank item-banks --set math-basic");
    println!("  3. Run: ldscreen intake --user <id> --age <age> && ldscreen predict --user <id>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# ldscreen configuration

data_file = "./ldscreen-data.json"
output_dir = "./ldscreen-reports"
attempt_ttl_secs = 3600

[model]
path = "./models/ld_model.json"
"#;

const STARTER_BANK: &str = include_str!("../../item-banks/starter.toml");
