//! Application configuration.
//!
//! Settings are layered: built-in defaults, then the optional JSON file under
//! the user's config directory, then `STOCKROOM_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::DEFAULT_CATEGORIES;

/// Directory under `~/.config` holding the config file.
pub const CONFIG_DIR: &str = "stockroom";
/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";
/// Prefix for environment overrides, e.g. `STOCKROOM_ADMIN_PASSWORD`.
pub const ENV_PREFIX: &str = "STOCKROOM";

/// Runtime settings for the inventory tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the inventory file, purchase log and app logs.
    pub data_dir: PathBuf,
    /// Inventory document file name inside `data_dir`.
    pub inventory_file: String,
    /// Purchase log file name inside `data_dir`.
    pub log_file: String,
    /// Shared admin secret.
    pub admin_password: String,
    /// Categories used when creating a fresh inventory.
    pub default_categories: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            inventory_file: "items.json".to_string(),
            log_file: "log.txt".to_string(),
            admin_password: "admin".to_string(),
            default_categories: DEFAULT_CATEGORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location plus environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` plus environment. A missing file is
    /// not an error; defaults fill the gaps.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path.as_ref(), environment())
    }

    fn load_with(path: &Path, environment: Environment) -> Result<Self> {
        let defaults =
            Config::try_from(&AppConfig::default()).context("failed to build default config")?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config in {}", path.display()))
    }

    /// Full path of the inventory document.
    pub fn inventory_path(&self) -> PathBuf {
        self.data_dir.join(&self.inventory_file)
    }

    /// Full path of the purchase log.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file)
    }

    /// Directory for application (tracing) logs.
    pub fn app_log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// `STOCKROOM_ADMIN_PASSWORD` style overrides; `__` separates nested keys.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

/// Default config file location.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write the default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    ensure_config_at(config_path())
}

/// Write the default config to `path` if it does not exist.
pub fn ensure_config_at(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let serialised = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialise default config")?;
    fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn env_with(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        environment().source(Some(vars))
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.json"))?;
        assert_eq!(config.inventory_file, "items.json");
        assert_eq!(config.log_file, "log.txt");
        assert_eq!(config.default_categories.len(), 4);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        let contents = serde_json::json!({
            "data_dir": dir.path(),
            "inventory_file": "stock.json",
            "default_categories": ["Tools"],
        });
        fs::write(&path, serde_json::to_string_pretty(&contents)?)?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.inventory_path(), dir.path().join("stock.json"));
        assert_eq!(config.log_path(), dir.path().join("log.txt"));
        assert_eq!(config.default_categories, vec!["Tools".to_string()]);
        Ok(())
    }

    #[test]
    fn ensure_config_writes_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("config.json");
        ensure_config_at(&path)?;
        assert!(path.exists());

        fs::write(&path, r#"{"log_file": "purchases.txt"}"#)?;
        ensure_config_at(&path)?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.log_file, "purchases.txt");
        Ok(())
    }

    #[test]
    fn single_underscore_env_overrides_file_and_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"admin_password": "from-file"}"#)?;

        let env = env_with(&[
            ("STOCKROOM_ADMIN_PASSWORD", "hunter2"),
            ("STOCKROOM_LOG_FILE", "sales.txt"),
            ("OTHER_ADMIN_PASSWORD", "ignored"),
        ]);
        let config = AppConfig::load_with(&path, env)?;
        assert_eq!(config.admin_password, "hunter2");
        assert_eq!(config.log_file, "sales.txt");
        assert_eq!(config.inventory_file, "items.json");
        Ok(())
    }

    #[test]
    fn double_underscore_prefix_is_not_read() -> Result<()> {
        let dir = tempdir()?;
        let env = env_with(&[("STOCKROOM__ADMIN_PASSWORD", "hunter2")]);
        let config = AppConfig::load_with(&dir.path().join("absent.json"), env)?;
        assert_eq!(config.admin_password, "admin");
        Ok(())
    }
}
