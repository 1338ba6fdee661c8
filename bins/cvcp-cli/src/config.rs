//! CLI configuration: built-in defaults, then an optional TOML file, then
//! `CVCP_*` environment variables.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `CVCP_REGISTRY__HISTORY_CAP=50`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cvcp_registry::RegistryConfig;
use serde::Deserialize;

/// File name looked up inside the config directory.
pub const CONFIG_FILE_NAME: &str = "cvcp.toml";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log output format ("text" or "json").
    pub log_format: String,
    /// Default owner for newly created registries, `0x`-prefixed hex.
    pub owner: Option<String>,
    /// Where registry state is persisted between runs.
    pub state_file: PathBuf,
    pub registry: RegistryConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            owner: None,
            state_file: default_data_dir().join("registry.state"),
            registry: RegistryConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration.
    ///
    /// `path` overrides the default file location. A missing default file is
    /// fine; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_dir().join(CONFIG_FILE_NAME), false),
        };

        let cfg: CliConfig = ::config::Config::builder()
            .add_source(::config::File::from(file.clone()).required(required))
            .add_source(
                ::config::Environment::with_prefix("CVCP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration from {}", file.display()))?
            .try_deserialize()
            .context("invalid configuration")?;

        cfg.registry
            .validate()
            .context("invalid [registry] configuration")?;
        Ok(cfg)
    }
}

/// `~/.config/cvcp` or the platform equivalent.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cvcp")
}

/// `~/.local/share/cvcp` or the platform equivalent.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cvcp")
}
