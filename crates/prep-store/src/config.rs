use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::ObjectStore;
use crate::error::Result;
use crate::file::FileSystemStore;
use crate::memory::InMemoryStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    #[default]
    File,
}

/// Where history objects and locks are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,
    /// Directory of the file backend. Ignored by the memory backend.
    pub location: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::File,
            location: PathBuf::from(".prep-store"),
        }
    }
}

impl StoreConfig {
    pub fn memory() -> Self {
        Self {
            kind: StoreKind::Memory,
            ..Self::default()
        }
    }

    pub fn file(location: impl Into<PathBuf>) -> Self {
        Self {
            kind: StoreKind::File,
            location: location.into(),
        }
    }

    pub fn open(&self) -> Result<Arc<dyn ObjectStore>> {
        Ok(match self.kind {
            StoreKind::Memory => Arc::new(InMemoryStore::new()),
            StoreKind::File => Arc::new(FileSystemStore::new(&self.location)?),
        })
    }
}
