use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{Inspector, TagMap, TypeMap};
use crate::cache::{self, CacheKey, CacheStore};
use crate::error::Result;

const DEFAULT_NAMESPACE: &str = "sijill::CachedInspector";

/// Inspector decorator persisting each result in a cache store.
///
/// Every accessor owns one cache entry, addressed by the md5 of
/// `"<namespace>::<accessor>"`. A hit returns the stored result without
/// calling the wrapped inspector. Pair it with a
/// [`FileCache`](crate::cache::FileCache) to reuse results across
/// processes.
///
/// # Examples
/// ```rust
/// use sijill_container::cache::MemoryCache;
/// use sijill_container::prelude::*;
/// use std::sync::Arc;
///
/// let container = Container::builder()
///     .service::<u32, _>("answer", |_| Ok(42))
///     .build()
///     .unwrap();
///
/// let inspector = CachedInspector::new(ContainerInspector::new(&container), Arc::new(MemoryCache::new()));
/// assert_eq!(inspector.service_ids().unwrap(), ["answer"]);
/// ```
pub struct CachedInspector<I> {
    inner: I,
    cache: Arc<dyn CacheStore>,
    namespace: String,
}

impl<I: Inspector> CachedInspector<I> {
    pub fn new(inner: I, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            cache,
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Separates the entries of this inspector from others sharing the
    /// same store.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }

    fn cached<T, F>(&self, accessor: &str, compute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&I) -> Result<T>,
    {
        let key = CacheKey::new(&format!("{}::{accessor}", self.namespace));

        if let Some(value) = cache::load(&*self.cache, &key)? {
            return Ok(value);
        }

        debug!(accessor, key = %key, "Computing inspector result");
        let value = compute(&self.inner)?;
        cache::save(&*self.cache, &key, &value)?;
        Ok(value)
    }
}

impl<I: Inspector> Inspector for CachedInspector<I> {
    fn service_ids(&self) -> Result<Vec<String>> {
        self.cached("service_ids", |inner| inner.service_ids())
    }

    fn typed_service_ids(&self) -> Result<TypeMap> {
        self.cached("typed_service_ids", |inner| inner.typed_service_ids())
    }

    fn tagged_service_ids(&self) -> Result<TagMap> {
        self.cached("tagged_service_ids", |inner| inner.tagged_service_ids())
    }
}

impl<I> fmt::Debug for CachedInspector<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedInspector")
            .field("namespace", &self.namespace)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{FileCache, MemoryCache};
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingInspector {
        calls: Cell<u32>,
    }

    impl Inspector for CountingInspector {
        fn service_ids(&self) -> Result<Vec<String>> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec!["bar_service".into(), "foo_service".into()])
        }

        fn typed_service_ids(&self) -> Result<TypeMap> {
            self.calls.set(self.calls.get() + 1);
            Ok(TypeMap::from([("app::Foo".to_string(), "foo_service".to_string())]))
        }

        fn tagged_service_ids(&self) -> Result<TagMap> {
            self.calls.set(self.calls.get() + 1);
            Ok(TagMap::from([("my_tag".to_string(), vec!["bar_service".to_string()])]))
        }
    }

    #[test]
    fn second_call_hits_cache() {
        let inspector = CachedInspector::new(CountingInspector::default(), Arc::new(MemoryCache::new()));

        let first = inspector.typed_service_ids().unwrap();
        let second = inspector.typed_service_ids().unwrap();

        assert_eq!(first, second);
        assert_eq!(inspector.inner().calls.get(), 1);
    }

    #[test]
    fn accessors_have_separate_entries() {
        let cache = Arc::new(MemoryCache::new());
        let inspector = CachedInspector::new(CountingInspector::default(), cache.clone());

        inspector.service_ids().unwrap();
        inspector.typed_service_ids().unwrap();
        inspector.tagged_service_ids().unwrap();

        assert_eq!(cache.len(), 3);
        assert_eq!(inspector.inner().calls.get(), 3);
    }

    #[test]
    fn stored_payload_is_returned() {
        let cache = Arc::new(MemoryCache::new());
        let key = CacheKey::new("sijill::CachedInspector::service_ids");
        cache::save(&*cache, &key, &vec!["stale"]).unwrap();

        let inspector = CachedInspector::new(CountingInspector::default(), cache);
        assert_eq!(inspector.service_ids().unwrap(), ["stale"]);
        assert_eq!(inspector.inner().calls.get(), 0);
    }

    #[test]
    fn namespaces_do_not_share_entries() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());

        let a = CachedInspector::new(CountingInspector::default(), cache.clone()).with_namespace("a");
        let b = CachedInspector::new(CountingInspector::default(), cache).with_namespace("b");

        a.service_ids().unwrap();
        b.service_ids().unwrap();
        assert_eq!(b.inner().calls.get(), 1);
    }

    #[test]
    fn file_cache_survives_new_inspector() {
        let dir = tempfile::tempdir().unwrap();

        let first = CachedInspector::new(CountingInspector::default(), Arc::new(FileCache::new(dir.path())));
        let tags = first.tagged_service_ids().unwrap();

        let second = CachedInspector::new(CountingInspector::default(), Arc::new(FileCache::new(dir.path())));
        assert_eq!(second.tagged_service_ids().unwrap(), tags);
        assert_eq!(second.inner().calls.get(), 0);
    }
}
