pub mod attempt;
pub mod init;
pub mod intake;
pub mod report;
pub mod scores;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};

use ldscreen_core::classifier::RiskClassifier;
use ldscreen_core::config::{load_config_from, LdscreenConfig};
use ldscreen_core::engine::ScreeningEngine;
use ldscreen_core::store::RecordStore;

/// Load the config and open the engine over the configured data file.
///
/// The model is not loaded here; only `predict` needs it.
pub fn open_engine(
    config_path: Option<PathBuf>,
) -> Result<(LdscreenConfig, ScreeningEngine<RecordStore>)> {
    let config = load_config_from(config_path.as_deref())?;
    let store = RecordStore::open(&config.data_file)
        .with_context(|| format!("failed to open data file {}", config.data_file.display()))?;
    let engine = ScreeningEngine::new(
        store,
        RiskClassifier::new(config.model.clone()),
        config.engine_config(),
    );
    Ok((config, engine))
}
