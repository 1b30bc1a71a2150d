//! Helpers shared by the Chainview binaries

use crate::config::{load_config_from, Config, DEFAULT_CONFIG_PATH};
use crate::mempool::PendingPool;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, honouring `RUST_LOG` and defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// The `--config` argument, or `config.toml` in the working directory.
pub fn config_path(arg: Option<PathBuf>) -> PathBuf {
    arg.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

pub fn load(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config = load_config_from(path)?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Open the pending pool named in the configuration, creating it when absent.
pub fn open_pool(config: &Config) -> Result<PendingPool, Box<dyn std::error::Error>> {
    let pool = PendingPool::from_config(&config.store);
    if pool.init()? {
        tracing::info!("Created empty pending pool at {}", pool.path().display());
    }
    Ok(pool)
}
