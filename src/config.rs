//! YAML configuration.
//!
//! ```yaml
//! hue_hub_url: "http://192.168.1.2/api/<key>"
//! request_timeout_ms: 5000
//! plugins:
//!   discoveries:
//!     path: /etc/huemon/plugins/discoveries
//! ```
//!
//! Lookup: `--config` > `HUEMON_CONFIG_PATH` > `./config.yml`. Unknown keys
//! are ignored so one file can serve other huemon components.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "HUEMON_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "config.yml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub hue_hub_url: Option<String>,
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    #[serde(default)]
    pub plugins: PluginsConfig,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PluginsConfig {
    #[serde(default)]
    pub discoveries: Option<PluginPathConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PluginPathConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        // An empty file parses as YAML null.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("Failed to parse configuration YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// External discovery plugin directory, if configured.
    pub fn discovery_plugins_path(&self) -> Option<&Path> {
        self.plugins
            .discoveries
            .as_ref()
            .and_then(|d| d.path.as_deref())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Resolve and load the configuration.
///
/// An explicitly named file (flag or env) must exist; a missing default
/// `config.yml` yields the default configuration.
pub fn resolve_config(explicit: Option<PathBuf>) -> Result<Config> {
    resolve_config_from(
        explicit,
        std::env::var(CONFIG_ENV).ok(),
        Path::new(DEFAULT_CONFIG_FILE),
    )
}

fn resolve_config_from(
    explicit: Option<PathBuf>,
    env_path: Option<String>,
    default_path: &Path,
) -> Result<Config> {
    let explicit = explicit.or_else(|| {
        env_path
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    });

    match explicit {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            Config::load(&path)
        }
        None if default_path.exists() => {
            info!(path = %default_path.display(), "loading configuration");
            Config::load(default_path)
        }
        None => {
            debug!("no configuration file found; using defaults");
            Ok(Config::default())
        }
    }
}
