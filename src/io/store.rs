use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::model::item::{Folder, Template};

/// Settings key holding the template list
pub const TEMPLATES_KEY: &str = "tile-templates";
/// Settings key holding the folder list
pub const FOLDERS_KEY: &str = "tile-template-folders";

/// Error type for settings store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("malformed settings in {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("setting {key} has the wrong shape: {source}")]
    Shape {
        key: String,
        source: serde_json::Error,
    },
}

/// A key-value settings store that reads and writes whole values.
pub trait SettingsStore {
    /// The value under `key`, or `Value::Null` when unset
    fn get(&self, key: &str) -> Result<Value, StoreError>;
    /// Replace the value under `key`
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Write `content` to `path` atomically (temp file in the same directory,
/// then rename).
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON file store
// ---------------------------------------------------------------------------

/// Settings kept in one JSON object on disk. Every `set` rewrites the file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<serde_json::Map<String, Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(serde_json::Map::new()),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Malformed {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Value, StoreError> {
        Ok(self.read_all()?.get(key).cloned().unwrap_or(Value::Null))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);
        let mut text = serde_json::to_string_pretty(&all).map_err(|source| {
            StoreError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        text.push('\n');
        atomic_write(&self.path, text.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(key, path = %self.path.display(), "wrote setting");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Settings held in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
    /// Number of `set` calls, for asserting write batching
    pub writes: usize,
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Value, StoreError> {
        Ok(self.values.get(key).cloned().unwrap_or(Value::Null))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        self.writes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Typed access to the template and folder lists of a settings store.
/// An unset key loads as an empty list.
#[derive(Debug)]
pub struct Repository<S> {
    store: S,
}

impl<S: SettingsStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Repository { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn load_templates(&self) -> Result<Vec<Template>, StoreError> {
        self.load(TEMPLATES_KEY)
    }

    pub fn save_templates(&mut self, templates: &[Template]) -> Result<(), StoreError> {
        self.save(TEMPLATES_KEY, templates)
    }

    pub fn load_folders(&self) -> Result<Vec<Folder>, StoreError> {
        self.load(FOLDERS_KEY)
    }

    pub fn save_folders(&mut self, folders: &[Folder]) -> Result<(), StoreError> {
        self.save(FOLDERS_KEY, folders)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        match self.store.get(key)? {
            Value::Null => Ok(Vec::new()),
            value => serde_json::from_value(value).map_err(|source| StoreError::Shape {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save<T: Serialize>(&mut self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let value = serde_json::to_value(items).map_err(|source| StoreError::Shape {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, value)
    }
}
