use crate::{Result, SearchResult, SeekError};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, warn};

/// A named key-value slot holding serialized state.
pub trait Storage {
    /// Reads the value stored under `key`, or `None` if nothing was stored yet.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replaces the value stored under `key`.
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(SeekError::Storage(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&tmp, value))
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| SeekError::Storage(format!("failed to write {}: {}", path.display(), e)))
    }
}

/// Keeps values in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a storage already holding `value` under `key`.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.lock().insert(key.into(), value.into());
        storage
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The `FavoritesStore` struct holds the user's bookmarked results in insertion order
/// and writes the whole collection back to its storage after every change.
pub struct FavoritesStore<S: Storage> {
    storage: S,
    favorites: Vec<SearchResult>,
}

impl<S: Storage> FavoritesStore<S> {
    /// Loads the favorites persisted in `storage`.
    ///
    /// Missing, unreadable or corrupt data yields an empty collection.
    pub fn load(storage: S) -> Self {
        let favorites = match storage.load(crate::FAVORITES_KEY) {
            Ok(Some(saved)) => match serde_json::from_str::<Vec<SearchResult>>(&saved) {
                Ok(favorites) => favorites,
                Err(e) => {
                    warn!("Ignoring corrupt favorites: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                error!("Failed to load favorites: {}", e);
                Vec::new()
            }
        };

        debug!(count = favorites.len(), "Favorites loaded");
        Self { storage, favorites }
    }

    /// Appends `result`. Does not check for an existing entry with the same URL.
    pub fn add(&mut self, result: SearchResult) {
        self.favorites.push(result);
        self.persist();
    }

    /// Removes every entry whose URL equals `url`.
    pub fn remove(&mut self, url: &str) {
        self.favorites.retain(|favorite| favorite.url != url);
        self.persist();
    }

    pub fn is_favorite(&self, url: &str) -> bool {
        self.favorites.iter().any(|favorite| favorite.url == url)
    }

    /// Removes `result` if it is a favorite, adds it otherwise.
    ///
    /// # Returns
    ///
    /// `true` if `result` is a favorite afterwards.
    pub fn toggle(&mut self, result: &SearchResult) -> bool {
        if self.is_favorite(&result.url) {
            self.remove(&result.url);
            false
        } else {
            self.add(result.clone());
            true
        }
    }

    pub fn favorites(&self) -> &[SearchResult] {
        &self.favorites
    }

    /// The titles of all favorites, in insertion order.
    pub fn titles(&self) -> Vec<String> {
        self.favorites.iter().map(|f| f.title.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self) {
        let saved = serde_json::to_string(&self.favorites)
            .map_err(SeekError::from)
            .and_then(|json| self.storage.save(crate::FAVORITES_KEY, &json));

        if let Err(e) = saved {
            error!("Failed to persist favorites: {}", e);
        }
    }
}
