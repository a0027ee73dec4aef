use crate::error::{Result, StoreError};

/// Raw document storage keyed by `(kind, id)`.
///
/// Implementations must be safe to share between threads. A write replaces
/// any previous document with the same key.
pub trait ObjectStore: Send + Sync {
    fn read(&self, kind: &str, id: &str) -> Result<Option<String>>;

    fn write(&self, kind: &str, id: &str, document: &str) -> Result<()>;

    /// Returns whether a document was removed.
    fn delete(&self, kind: &str, id: &str) -> Result<bool>;

    /// Every document of `kind`, in id order.
    fn list(&self, kind: &str) -> Result<Vec<String>>;

    /// Remove every document of every kind.
    fn clear(&self) -> Result<()>;

    /// Short description for logs, e.g. `memory` or `file:/var/prep`.
    fn describe(&self) -> String;
}

pub(crate) fn check_key(kind: &str, id: &str) -> Result<()> {
    if kind.is_empty() || id.is_empty() {
        return Err(StoreError::InvalidId {
            kind: kind.to_string(),
            id: id.to_string(),
        });
    }
    Ok(())
}
