//! ldscreen configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::classifier::ModelSpec;
use crate::engine::EngineConfig;

/// Top-level ldscreen configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdscreenConfig {
    /// JSON file backing the record store.
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
    /// Seconds an opened attempt stays submittable.
    #[serde(default = "default_attempt_ttl")]
    pub attempt_ttl_secs: u64,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub model: ModelSpec,
}

/// Longest accepted `attempt_ttl_secs`: 30 days.
pub const MAX_ATTEMPT_TTL_SECS: u64 = 30 * 24 * 3600;

fn default_data_file() -> PathBuf {
    PathBuf::from("./ldscreen-data.json")
}
fn default_attempt_ttl() -> u64 {
    3600
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./ldscreen-reports")
}

impl Default for LdscreenConfig {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            attempt_ttl_secs: default_attempt_ttl(),
            output_dir: default_output_dir(),
            model: ModelSpec::default(),
        }
    }
}

impl LdscreenConfig {
    pub fn engine_config(&self) -> EngineConfig {
        let secs = self.attempt_ttl_secs.min(MAX_ATTEMPT_TTL_SECS) as i64;
        EngineConfig {
            attempt_ttl: Duration::seconds(secs),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.attempt_ttl_secs > MAX_ATTEMPT_TTL_SECS {
            anyhow::bail!(
                "attempt_ttl_secs = {} exceeds the maximum of {MAX_ATTEMPT_TTL_SECS}",
                self.attempt_ttl_secs
            );
        }
        Ok(())
    }

    /// Apply `LDSCREEN_*` overrides and expand `${VAR}` in path values.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("LDSCREEN_DATA_FILE") {
            self.data_file = PathBuf::from(path);
        }
        if let Some(path) = lookup("LDSCREEN_MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }

        let expand = |p: &Path| PathBuf::from(resolve_env_vars(&p.to_string_lossy(), &lookup));
        self.data_file = expand(&self.data_file);
        self.output_dir = expand(&self.output_dir);
        self.model.path = expand(&self.model.path);
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&lookup(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `ldscreen.toml` in the current directory
/// 2. `~/.config/ldscreen/config.toml`
///
/// Environment variable overrides: `LDSCREEN_DATA_FILE`, `LDSCREEN_MODEL_PATH`.
pub fn load_config() -> Result<LdscreenConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<LdscreenConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("ldscreen.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config_file(&path)?,
        None => LdscreenConfig::default(),
    };
    config.apply_env(|name| std::env::var(name).ok());

    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<LdscreenConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config = toml::from_str::<LdscreenConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("ldscreen"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::DEFAULT_FEATURE_ORDER;

    fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn resolve_env_vars_basic() {
        let lookup = env(&[("_LDSCREEN_TEST_VAR", "hello")]);
        assert_eq!(resolve_env_vars("${_LDSCREEN_TEST_VAR}", &lookup), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_LDSCREEN_TEST_VAR}_suffix", &lookup),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${MISSING}/x", &lookup), "/x");
        assert_eq!(resolve_env_vars("${unterminated", &lookup), "${unterminated");
    }

    #[test]
    fn resolve_env_vars_does_not_expand_values() {
        let lookup = env(&[("SELF", "${SELF}"), ("A", "${B}"), ("B", "b")]);
        assert_eq!(resolve_env_vars("${SELF}/data.json", &lookup), "${SELF}/data.json");
        assert_eq!(resolve_env_vars("${A}-${B}", &lookup), "${B}-b");

        let mut config = LdscreenConfig::default();
        config.apply_env(env(&[("LDSCREEN_DATA_FILE", "${LDSCREEN_DATA_FILE}")]));
        assert_eq!(config.data_file, PathBuf::from("${LDSCREEN_DATA_FILE}"));
    }

    #[test]
    fn default_config() {
        let config = LdscreenConfig::default();
        assert_eq!(config.data_file, PathBuf::from("./ldscreen-data.json"));
        assert_eq!(config.attempt_ttl_secs, 3600);
        assert_eq!(config.model.path, PathBuf::from("./models/ld_model.json"));
        assert_eq!(config.model.feature_order.len(), DEFAULT_FEATURE_ORDER.len());
        assert_eq!(config.engine_config().attempt_ttl, Duration::hours(1));
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r#"
attempt_ttl_secs = 60

[model]
name = "district-2024"
"#;
        let config: LdscreenConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.attempt_ttl_secs, 60);
        assert_eq!(config.model.name.as_deref(), Some("district-2024"));
        assert_eq!(config.model.path, PathBuf::from("./models/ld_model.json"));
        assert_eq!(config.output_dir, PathBuf::from("./ldscreen-reports"));
    }

    #[test]
    fn env_overrides_and_expansion() {
        let mut config: LdscreenConfig = toml::from_str(
            r#"
output_dir = "${REPORT_ROOT}/out"
"#,
        )
        .unwrap();
        config.apply_env(env(&[
            ("LDSCREEN_DATA_FILE", "/tmp/data.json"),
            ("LDSCREEN_MODEL_PATH", "${MODELS}/m.json"),
            ("MODELS", "/srv/models"),
            ("REPORT_ROOT", "/srv/reports"),
        ]));
        assert_eq!(config.data_file, PathBuf::from("/tmp/data.json"));
        assert_eq!(config.model.path, PathBuf::from("/srv/models/m.json"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/reports/out"));
    }

    #[test]
    fn explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_config_from(Some(&missing)).is_err());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ldscreen.toml");
        std::fs::write(&path, "attempt_ttl_secs = 120\n").unwrap();
        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.attempt_ttl_secs, 120);
    }

    #[test]
    fn malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ldscreen.toml");
        std::fs::write(&path, "attempt_ttl_secs = \"soon\"\n").unwrap();
        assert!(parse_config_file(&path).is_err());
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ldscreen.toml");
        std::fs::write(&path, "attempt_ttl_secs = 9223372036854775807\n").unwrap();
        let err = parse_config_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("exceeds the maximum"));

        let config = LdscreenConfig {
            attempt_ttl_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            config.engine_config().attempt_ttl,
            Duration::seconds(MAX_ATTEMPT_TTL_SECS as i64)
        );
    }
}
