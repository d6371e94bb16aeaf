//! The `ldscreen validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(item_bank_path: PathBuf) -> Result<()> {
    let banks = ldscreen_core::parser::load_item_banks(&item_bank_path)?;

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Item bank: {} ({} sets)", bank.name, bank.sets.len());

        let warnings = ldscreen_core::parser::validate_item_bank(bank);
        for w in &warnings {
            let prefix = w
                .set_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All item banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
