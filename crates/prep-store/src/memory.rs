use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backend::{ObjectStore, check_key};
use crate::error::{Result, StoreError};

type Documents = BTreeMap<(String, String), String>;

/// Documents kept in a map for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: RwLock<Documents>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn documents(&self) -> Result<RwLockReadGuard<'_, Documents>> {
        self.documents.read().map_err(|_| StoreError::Poisoned)
    }

    fn documents_mut(&self) -> Result<RwLockWriteGuard<'_, Documents>> {
        self.documents.write().map_err(|_| StoreError::Poisoned)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.documents()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.documents()?.is_empty())
    }
}

impl ObjectStore for InMemoryStore {
    fn read(&self, kind: &str, id: &str) -> Result<Option<String>> {
        check_key(kind, id)?;
        Ok(self
            .documents()?
            .get(&(kind.to_string(), id.to_string()))
            .cloned())
    }

    fn write(&self, kind: &str, id: &str, document: &str) -> Result<()> {
        check_key(kind, id)?;
        self.documents_mut()?
            .insert((kind.to_string(), id.to_string()), document.to_string());
        Ok(())
    }

    fn delete(&self, kind: &str, id: &str) -> Result<bool> {
        check_key(kind, id)?;
        Ok(self
            .documents_mut()?
            .remove(&(kind.to_string(), id.to_string()))
            .is_some())
    }

    fn list(&self, kind: &str) -> Result<Vec<String>> {
        Ok(self
            .documents()?
            .iter()
            .filter(|((k, _), _)| k == kind)
            .map(|(_, document)| document.clone())
            .collect())
    }

    fn clear(&self) -> Result<()> {
        self.documents_mut()?.clear();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
