//! TOML item bank parser.
//!
//! Loads item banks from TOML files and directories, and validates them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{BankSet, ItemBank, ItemSet};

/// Intermediate TOML structure for parsing item bank files.
#[derive(Debug, Deserialize)]
struct TomlBankFile {
    bank: TomlBankHeader,
    #[serde(default)]
    sets: Vec<BankSet>,
}

#[derive(Debug, Deserialize)]
struct TomlBankHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
}

/// Parse a single TOML file into an `ItemBank`.
pub fn parse_item_bank(path: &Path) -> Result<ItemBank> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read item bank file: {}", path.display()))?;

    parse_item_bank_str(&content, path)
}

/// Parse a TOML string into an `ItemBank` (useful for testing).
pub fn parse_item_bank_str(content: &str, source_path: &Path) -> Result<ItemBank> {
    let parsed: TomlBankFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    for set in &parsed.sets {
        if let ItemSet::Math { items } = &set.items {
            if let Some((i, item)) = items
                .iter()
                .enumerate()
                .find(|(_, item)| item.expected().is_none())
            {
                anyhow::bail!(
                    "{}: set '{}' item {}: {} is out of range",
                    source_path.display(),
                    set.id,
                    i + 1,
                    item
                );
            }
        }
    }

    Ok(ItemBank {
        id: parsed.bank.id,
        name: parsed.bank.name,
        description: parsed.bank.description,
        sets: parsed.sets,
    })
}

/// Load a bank from a file, or every bank under a directory.
pub fn load_item_banks(path: &Path) -> Result<Vec<ItemBank>> {
    if path.is_dir() {
        load_item_bank_directory(path)
    } else {
        Ok(vec![parse_item_bank(path)?])
    }
}

/// Recursively load all `.toml` item bank files from a directory.
pub fn load_item_bank_directory(dir: &Path) -> Result<Vec<ItemBank>> {
    let mut banks = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            banks.extend(load_item_bank_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_item_bank(&path) {
                Ok(bank) => banks.push(bank),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(banks)
}

/// Find a set by id across several banks.
pub fn find_set<'a>(banks: &'a [ItemBank], set_id: &str) -> Option<&'a BankSet> {
    banks.iter().find_map(|b| b.set(set_id))
}

/// A warning from item bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The set ID (if applicable).
    pub set_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate an item bank for common issues.
pub fn validate_item_bank(bank: &ItemBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_ids = std::collections::HashSet::new();
    for set in &bank.sets {
        if !seen_ids.insert(&set.id) {
            warnings.push(ValidationWarning {
                set_id: Some(set.id.clone()),
                message: format!("duplicate set ID: {}", set.id),
            });
        }
    }

    for set in &bank.sets {
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                set_id: Some(set.id.clone()),
                message,
            })
        };

        if set.items.is_empty() {
            match &set.items {
                ItemSet::Reading { .. } => warn("reading passage is empty".into()),
                _ => warn("set has no items".into()),
            }
        }

        match &set.items {
            ItemSet::Grammar { items } | ItemSet::Scenario { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if !item.options.is_empty() && !item.options.contains(&item.answer) {
                        warn(format!(
                            "item {}: answer {:?} is not among the options",
                            i + 1,
                            item.answer
                        ));
                    }
                }
            }
            ItemSet::Memory { sequence } => {
                if sequence.iter().any(|&d| d > 9) {
                    warn("memory sequence contains values above 9".into());
                }
            }
            ItemSet::Math { .. } | ItemSet::Reading { .. } => {}
        }
    }

    warnings
}
