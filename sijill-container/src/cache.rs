//! Cache stores for introspection results.
//!
//! Items are addressed by the md5 hex digest of a string key and hold an
//! opaque byte payload. [`load`] and [`save`] encode payloads as JSON.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{trace, warn};

use crate::error::{Result, SijillError};

/// Content-addressed cache key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    hash: String,
}

impl CacheKey {
    /// Hashes `key` into a cache address.
    ///
    /// ```
    /// use sijill_container::cache::CacheKey;
    ///
    /// let key = CacheKey::new("sijill::ObjectBuilder");
    /// assert_eq!(key.as_str().len(), 32);
    /// ```
    pub fn new(key: &str) -> Self {
        Self {
            hash: format!("{:x}", md5::compute(key.as_bytes())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.hash)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hash)
    }
}

/// Storage backend for cached payloads.
pub trait CacheStore: Send + Sync {
    /// Returns the payload stored under `key`, if any.
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>>;

    /// Stores `payload` under `key`, replacing any previous payload.
    fn set(&self, key: &CacheKey, payload: Vec<u8>) -> Result<()>;

    /// Returns `true` if `key` holds a payload.
    fn has(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Reads and decodes a JSON payload.
///
/// A payload that no longer decodes counts as a miss.
pub fn load<T: DeserializeOwned>(store: &dyn CacheStore, key: &CacheKey) -> Result<Option<T>> {
    let Some(payload) = store.get(key)? else {
        trace!(key = %key, "Cache miss");
        return Ok(None);
    };

    match serde_json::from_slice(&payload) {
        Ok(value) => {
            trace!(key = %key, "Cache hit");
            Ok(Some(value))
        }
        Err(err) => {
            warn!(key = %key, error = %err, "Discarding undecodable cache entry");
            Ok(None)
        }
    }
}

/// Encodes `value` as JSON and stores it.
pub fn save<T: Serialize + ?Sized>(store: &dyn CacheStore, key: &CacheKey, value: &T) -> Result<()> {
    let payload = serde_json::to_vec(value).map_err(|err| SijillError::cache(key.as_str(), err))?;
    store.set(key, payload)
}

/// In-process cache store.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<CacheKey, Vec<u8>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &CacheKey, payload: Vec<u8>) -> Result<()> {
        self.entries.insert(key.clone(), payload);
        Ok(())
    }

    fn has(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.entries.contains_key(key))
    }
}

/// Cache store keeping one file per key in a directory.
///
/// Survives the process, so introspection results are shared between
/// runs.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl CacheStore for FileCache {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SijillError::cache(key.as_str(), err)),
        }
    }

    fn set(&self, key: &CacheKey, payload: Vec<u8>) -> Result<()> {
        let path = self.path_for(key);
        let fail = |err: io::Error| SijillError::cache(key.as_str(), err);

        // Each writer stages into its own file; concurrent writers of one
        // key replace each other whole.
        fs::create_dir_all(&self.dir).map_err(fail)?;
        let mut staging = NamedTempFile::new_in(&self.dir).map_err(fail)?;
        staging.write_all(&payload).map_err(fail)?;
        staging.persist(&path).map_err(|err| fail(err.error))?;

        trace!(key = %key, path = %path.display(), "Stored cache entry");
        Ok(())
    }

    fn has(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.path_for(key).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn key_is_md5_hex() {
        let key = CacheKey::new("abc");
        assert_eq!(key.as_str(), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn memory_round_trip() {
        let store = MemoryCache::new();
        let key = CacheKey::new("ids");

        assert!(!store.has(&key).unwrap());
        save(&store, &key, &vec!["a", "b"]).unwrap();

        assert!(store.has(&key).unwrap());
        let ids: Option<Vec<String>> = load(&store, &key).unwrap();
        assert_eq!(ids, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn undecodable_payload_is_a_miss() {
        let store = MemoryCache::new();
        let key = CacheKey::new("broken");
        store.set(&key, b"not json".to_vec()).unwrap();

        let value: Option<Vec<String>> = load(&store, &key).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn file_cache_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let key = CacheKey::new("types");

        let mut map = BTreeMap::new();
        map.insert("app::Foo".to_string(), "foo".to_string());
        save(&FileCache::new(dir.path()), &key, &map).unwrap();

        let reopened = FileCache::new(dir.path());
        assert!(reopened.has(&key).unwrap());
        let loaded: Option<BTreeMap<String, String>> = load(&reopened, &key).unwrap();
        assert_eq!(loaded, Some(map));
    }

    #[test]
    fn concurrent_writers_of_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCache::new(dir.path());
        let key = CacheKey::new("types");

        for _ in 0..10 {
            std::thread::scope(|scope| {
                for writer in 0..8u8 {
                    let (store, key) = (&store, &key);
                    scope.spawn(move || {
                        store.set(key, vec![writer; 1 << 20]).unwrap();
                    });
                }
            });

            let payload = store.get(&key).unwrap().unwrap();
            assert_eq!(payload.len(), 1 << 20);
            assert!(payload.iter().all(|byte| *byte == payload[0]));
        }

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn file_cache_missing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCache::new(dir.path().join("nested"));

        assert_eq!(store.get(&CacheKey::new("nothing")).unwrap(), None);
    }
}
