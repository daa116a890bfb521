//! Key/value persistence of JSON collections.
//!
//! `DurableStorage` is the string-in/string-out medium; `CollectionStore` layers
//! typed whole-collection load/save on top of it. There are no transactions:
//! every save overwrites the key and the last writer wins.

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
    sync::Arc,
};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

pub mod keys {
    pub const BOARD_POSTS: &str = "boardPosts";
    pub const MAP_MARKERS: &str = "mapMarkers";

    pub fn comments(post_id: u64) -> String {
        format!("comments_{}", post_id)
    }

    pub fn recommended(post_id: u64) -> String {
        format!("recommended_{}", post_id)
    }
}

pub trait DurableStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-lifetime storage used by tests and `STORAGE_TYPE=memory`.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` document per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{}.json", file_name))
    }
}

impl DurableStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct CollectionStore {
    storage: Arc<dyn DurableStorage>,
}

impl CollectionStore {
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Missing, unreadable or malformed collections load as empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("{}", AppError::storage_corrupt(key, e));
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                debug!("Loaded {} items from {}", items.len(), key);
                items
            }
            Err(e) => {
                warn!("{}", AppError::storage_corrupt(key, e));
                Vec::new()
            }
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.storage.set_item(key, &raw)?;
        debug!("Saved {} items to {}", items.len(), key);
        Ok(())
    }
}
