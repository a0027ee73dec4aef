//! Persistence for preparation history objects.
//!
//! Objects are stored as JSON documents keyed by `(kind, id)` through an
//! [`ObjectStore`] backend. Two backends are provided:
//!
//! - [`InMemoryStore`] for tests and throw-away sessions
//! - [`FileSystemStore`], one `{Kind}-{id}.json` file per object, written
//!   atomically (temp file + rename)
//!
//! [`Repository`] is the typed facade used by the rest of the workspace. It
//! also guarantees the root step and its empty content always exist.

pub mod backend;
pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod repository;

pub use backend::ObjectStore;
pub use config::{StoreConfig, StoreKind};
pub use error::{Result, StoreError};
pub use file::FileSystemStore;
pub use memory::InMemoryStore;
pub use repository::Repository;
