//! Durable key/value storage with `localStorage` semantics.
//!
//! Values are strings. When opened on a file, every write is flushed to a
//! JSON object on disk so the next session sees it; write failures are logged
//! and the in-memory value still wins, mirroring how the page scripts swallow
//! quota errors.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use tracing::{debug, warn};

pub struct LocalStorage {
    path: Option<PathBuf>,
    items: Mutex<BTreeMap<String, String>>,
}

impl LocalStorage {
    /// Storage that lives only as long as this value.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            items: Mutex::new(BTreeMap::new()),
        }
    }

    /// Open file-backed storage, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)
                    .with_context(|| format!("Storage file {} is not a JSON object of strings", path.display()))?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened storage {} with {} keys", path.display(), items.len());
        Ok(Self {
            path: Some(path),
            items: Mutex::new(items),
        })
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: &str) {
        let mut items = self.lock();
        items.insert(key.to_string(), value.to_string());
        self.flush(&items);
    }

    pub fn remove_item(&self, key: &str) {
        let mut items = self.lock();
        if items.remove(key).is_some() {
            self.flush(&items);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, items: &BTreeMap<String, String>) {
        let Some(path) = &self.path else {
            return;
        };
        let written = serde_json::to_string_pretty(items)
            .map_err(anyhow::Error::from)
            .and_then(|json| std::fs::write(path, json).map_err(anyhow::Error::from));
        if let Err(e) = written {
            warn!("Storage write to {} failed: {}", path.display(), e);
        }
    }
}
