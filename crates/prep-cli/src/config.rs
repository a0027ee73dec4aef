//! `prep.toml` configuration.
//!
//! ```toml
//! [store]
//! kind = "file"
//! location = ".prep-store"
//!
//! [lock]
//! ttl_seconds = 60
//!
//! [data_sets]
//! known = ["countries", "customers"]
//! ```
//!
//! Every section and field is optional.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use prep_history::{DataSetsConfig, PreparationService, StaticDataSetCatalog};
use prep_lock::{LockConfig, LockManager};
use prep_store::{Repository, StoreConfig};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "prep.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub lock: LockConfig,
    pub data_sets: DataSetsConfig,
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("parse configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read configuration {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("load configuration {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// `path` when given, else [`DEFAULT_CONFIG_FILE`] if it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Replace the store directory, switching to the file backend.
    #[must_use]
    pub fn with_store_location(mut self, location: Option<PathBuf>) -> Self {
        if let Some(location) = location {
            self.store = StoreConfig::file(location);
        }
        self
    }

    /// History service over the configured store; locks live in the same store.
    pub fn open_service(&self) -> Result<PreparationService> {
        let store = self.store.open().context("open store")?;
        let repository = Repository::open(Arc::clone(&store)).context("seed store")?;
        let locks = LockManager::new(store).with_config(self.lock);
        let catalog = StaticDataSetCatalog::from_config(&self.data_sets);
        Ok(PreparationService::new(
            repository,
            Arc::new(locks),
            Arc::new(catalog),
        ))
    }
}
