//! Typed access to stored objects.

use std::sync::Arc;

use prep_model::{Identifiable, PreparationActions, Step};
use tracing::debug;

use crate::backend::ObjectStore;
use crate::error::{Result, StoreError};
use crate::memory::InMemoryStore;

/// Typed facade over an [`ObjectStore`].
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn ObjectStore>,
}

impl Repository {
    /// Wrap a backend as is.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Wrap a backend and make sure the history root is stored.
    pub fn open(store: Arc<dyn ObjectStore>) -> Result<Self> {
        let repository = Self::new(store);
        repository.seed_root()?;
        Ok(repository)
    }

    pub fn in_memory() -> Result<Self> {
        Self::open(Arc::new(InMemoryStore::new()))
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn get<T: Identifiable>(&self, id: &str) -> Result<Option<T>> {
        let Some(document) = self.store.read(T::KIND, id)? else {
            return Ok(None);
        };
        serde_json::from_str(&document)
            .map(Some)
            .map_err(|source| StoreError::Deserialization {
                kind: T::KIND.to_string(),
                id: id.to_string(),
                source,
            })
    }

    /// Like [`get`](Self::get), failing with [`StoreError::NotFound`].
    pub fn require<T: Identifiable>(&self, id: &str) -> Result<T> {
        self.get(id)?.ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
    }

    /// Store `object` under its own id, replacing any previous version.
    pub fn add<T: Identifiable>(&self, object: &T) -> Result<()> {
        let document =
            serde_json::to_string_pretty(object).map_err(|source| StoreError::Serialization {
                kind: T::KIND.to_string(),
                id: object.id().to_string(),
                source,
            })?;
        self.store.write(T::KIND, object.id(), &document)
    }

    pub fn remove<T: Identifiable>(&self, id: &str) -> Result<bool> {
        self.store.delete(T::KIND, id)
    }

    pub fn list_all<T: Identifiable>(&self) -> Result<Vec<T>> {
        self.store
            .list(T::KIND)?
            .into_iter()
            .map(|document| {
                serde_json::from_str(&document).map_err(|source| StoreError::Deserialization {
                    kind: T::KIND.to_string(),
                    id: String::new(),
                    source,
                })
            })
            .collect()
    }

    pub fn exists<T: Identifiable>(&self, id: &str) -> Result<bool> {
        Ok(self.store.read(T::KIND, id)?.is_some())
    }

    /// Drop every object and store the history root again.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        self.seed_root()?;
        debug!(store = %self.store.describe(), "repository cleared");
        Ok(())
    }

    /// The root step. Every history starts there.
    pub fn root_step(&self) -> Result<Step> {
        Ok(Step::root(&PreparationActions::root()?)?)
    }

    fn seed_root(&self) -> Result<()> {
        let content = PreparationActions::root()?;
        let root = Step::root(&content)?;
        if !self.exists::<PreparationActions>(content.id())? {
            self.add(&content)?;
        }
        if !self.exists::<Step>(root.id())? {
            self.add(&root)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("store", &self.store.describe())
            .finish()
    }
}
