//! File-system backend.
//!
//! Each document lives in `{root}/{Kind}-{id}.json`. Characters outside
//! `[A-Za-z0-9_-]` in ids are percent-encoded so any id maps to exactly one
//! file name. Writes go to a temp file that is synced and renamed over the
//! target.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::backend::{ObjectStore, check_key};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(StoreError::io("create directory", &root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, kind: &str, id: &str) -> PathBuf {
        self.root.join(file_name(kind, id))
    }

    fn documents_of(&self, kind: &str) -> Result<Vec<PathBuf>> {
        let prefix = format!("{}-", encode(kind));
        let entries = fs::read_dir(&self.root).map_err(StoreError::io("read directory", &self.root))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(StoreError::io("read directory", &self.root))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.starts_with(&prefix) && name.ends_with(".json") && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

impl ObjectStore for FileSystemStore {
    fn read(&self, kind: &str, id: &str) -> Result<Option<String>> {
        check_key(kind, id)?;
        let path = self.path_of(kind, id);
        match fs::read_to_string(&path) {
            Ok(document) => Ok(Some(document)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(error) => Err(StoreError::io("read", path)(error)),
        }
    }

    fn write(&self, kind: &str, id: &str, document: &str) -> Result<()> {
        check_key(kind, id)?;
        let path = self.path_of(kind, id);
        write_atomic(&path, document.as_bytes())?;
        debug!(kind, id, path = %path.display(), "document written");
        Ok(())
    }

    fn delete(&self, kind: &str, id: &str) -> Result<bool> {
        check_key(kind, id)?;
        let path = self.path_of(kind, id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(false),
            Err(error) => Err(StoreError::io("delete", path)(error)),
        }
    }

    fn list(&self, kind: &str) -> Result<Vec<String>> {
        self.documents_of(kind)?
            .into_iter()
            .map(|path| fs::read_to_string(&path).map_err(StoreError::io("read", path)))
            .collect()
    }

    fn clear(&self) -> Result<()> {
        let entries = fs::read_dir(&self.root).map_err(StoreError::io("read directory", &self.root))?;
        for entry in entries {
            let path = entry
                .map_err(StoreError::io("read directory", &self.root))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                fs::remove_file(&path).map_err(StoreError::io("delete", &path))?;
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.root.display())
    }
}

fn file_name(kind: &str, id: &str) -> String {
    format!("{}-{}.json", encode(kind), encode(id))
}

fn encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

/// Write `bytes` to `path` through a synced temp file and a rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    let mut file = File::create(&temp_path).map_err(StoreError::io("create", &temp_path))?;
    file.write_all(bytes)
        .map_err(StoreError::io("write", &temp_path))?;
    file.sync_all().map_err(StoreError::io("sync", &temp_path))?;

    fs::rename(&temp_path, path).map_err(|source| StoreError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source,
    })
}
