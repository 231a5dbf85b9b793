//! The `evo` CLI's own small on-disk preferences file — distinct from the
//! experiment configuration document (`evo_runtime::Config`), which this
//! crate only loads and validates, never edits.
//!
//! Grounded on `shnn-cli::config::CliConfig`'s load/save-to-TOML shape.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// Small set of CLI-level preferences, persisted as TOML.
#[derive(Debug, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default logging level used when `RUST_LOG` is unset.
    pub log_level: Option<String>,
    /// Default experiment configuration document, used when `-c` is
    /// omitted from `evo run`/`evo inspect`.
    pub default_config: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            default_config: None,
        }
    }
}

impl CliConfig {
    /// Load preferences from `path`, or defaults if the file doesn't exist.
    pub fn load_from_file(path: &Path) -> CliResult<Self> {
        if path.exists() {
            let text = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&text)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Write preferences to `path`, creating parent directories as needed.
    pub fn save_to_file(&self, path: &Path) -> CliResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| anyhow::anyhow!(e))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, text)?;
        Ok(())
    }

    /// The default preferences-file path
    /// (`$XDG_CONFIG_HOME/evo/config.toml` or the platform equivalent).
    pub fn default_path() -> CliResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("evo").join("config.toml"))
            .ok_or_else(|| CliError::NoConfigDir("could not determine a config directory".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = CliConfig::load_from_file(&path).unwrap();
        assert_eq!(cfg.log_level.as_deref(), Some("info"));
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut cfg = CliConfig::default();
        cfg.log_level = Some("debug".into());
        cfg.save_to_file(&path).unwrap();
        let loaded = CliConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.log_level.as_deref(), Some("debug"));
    }
}
