//! Configuration management for Chainview

use crate::block::HeaderSchema;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_allow_any_origin")]
    pub allow_any_origin: bool,
}

/// Locations of the persisted ledger, accounts and pending pool.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_blocks_path")]
    pub blocks_path: PathBuf,
    #[serde(default = "default_accounts_path")]
    pub accounts_path: PathBuf,
    #[serde(default = "default_mempool_path")]
    pub mempool_path: PathBuf,
    #[serde(default)]
    pub header_schema: HeaderSchema,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            bind: default_bind(),
            allow_any_origin: default_allow_any_origin(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            blocks_path: default_blocks_path(),
            accounts_path: default_accounts_path(),
            mempool_path: default_mempool_path(),
            header_schema: HeaderSchema::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.port == 0 {
            return Err(ConfigError::Invalid("api.port must be non-zero".to_string()));
        }
        if self.api.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("api.bind must be set".to_string()));
        }
        for (name, path) in [
            ("store.blocks_path", &self.store.blocks_path),
            ("store.accounts_path", &self.store.accounts_path),
            ("store.mempool_path", &self.store.mempool_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must be set", name)));
            }
        }
        Ok(())
    }
}

/// Load `config.toml` from the working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new(DEFAULT_CONFIG_PATH))
}

/// Load a configuration file, falling back to defaults when it is absent.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config = if path.exists() {
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_config(&config_str)?
    } else {
        tracing::info!("No config at {}, using defaults", path.display());
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(config_str)?)
}

fn default_api_port() -> u16 {
    8888
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_allow_any_origin() -> bool {
    true
}

fn default_blocks_path() -> PathBuf {
    PathBuf::from("./blockchain.json")
}

fn default_accounts_path() -> PathBuf {
    PathBuf::from("./accounts.json")
}

fn default_mempool_path() -> PathBuf {
    PathBuf::from("./mempool.json")
}
