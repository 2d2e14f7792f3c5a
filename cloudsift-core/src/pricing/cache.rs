use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::CacheError;

/// Default location of the persisted price cache.
pub const DEFAULT_CACHE_FILE: &str = "cache/costs.json";

/// Unit prices keyed by `kind:region:discriminator`, persisted as one JSON
/// object.
///
/// `get` and `set` only touch memory. `save` writes a snapshot to a sibling
/// temp file and renames it over the cache file; concurrent saves are
/// serialised.
#[derive(Debug)]
pub struct PriceCache {
    path: PathBuf,
    prices: RwLock<HashMap<String, f64>>,
    save_lock: Mutex<()>,
}

impl PriceCache {
    /// An empty cache backed by `path`. Nothing is read until [`load`](Self::load).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            prices: RwLock::new(HashMap::new()),
            save_lock: Mutex::new(()),
        }
    }

    /// Creates a cache and loads whatever `path` already holds.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache = Self::new(path);
        cache.load().await?;
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.prices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .copied()
    }

    pub fn set(&self, key: impl Into<String>, price: f64) {
        self.prices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), price);
    }

    pub fn len(&self) -> usize {
        self.prices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replaces the in-memory entries with the file contents.
    ///
    /// A missing file leaves the cache empty.
    pub async fn load(&self) -> Result<(), CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(target: "pricing", path = %self.path.display(), "no price cache on disk");
                return Ok(());
            }
            Err(source) => {
                return Err(CacheError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let loaded: HashMap<String, f64> =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Parse {
                path: self.path.clone(),
                source,
            })?;

        debug!(target: "pricing", path = %self.path.display(), entries = loaded.len(), "loaded price cache");
        *self
            .prices
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = loaded;
        Ok(())
    }

    /// Persists the current entries with a temp file and rename.
    pub async fn save(&self) -> Result<(), CacheError> {
        let _guard = self.save_lock.lock().await;

        let snapshot: BTreeMap<String, f64> = self
            .prices
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(key, price)| (key.clone(), *price))
            .collect();
        let encoded = serde_json::to_vec(&snapshot).map_err(CacheError::Encode)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| CacheError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let tmp = temp_path(&self.path);
        tokio::fs::write(&tmp, &encoded)
            .await
            .map_err(|source| CacheError::Write {
                path: tmp.clone(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::Rename {
                from: tmp,
                to: self.path.clone(),
                source,
            });
        }

        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
