//! Container settings.
//!
//! Settings are plain data so embedders can load them from whatever
//! configuration source they already use (they derive serde's traits),
//! or set them with the builder-style setters.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheStore, FileCache, MemoryCache};

/// What the inspector does when two services declare the same type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// The service processed last owns the type.
    #[default]
    Override,
    /// The service processed first owns the type.
    KeepFirst,
    /// Conflicts fail with [`SijillError::TypeConflict`](crate::error::SijillError::TypeConflict).
    Reject,
}

/// Behaviour switches shared by a container and the resolvers built on it.
///
/// # Examples
/// ```
/// use sijill_container::settings::{ConflictPolicy, Settings};
///
/// let settings = Settings::default()
///     .debug(true)
///     .conflict_policy(ConflictPolicy::Reject);
///
/// assert!(settings.debug);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Recompute per-class injection maps on every build instead of
    /// caching them.
    pub debug: bool,
    /// Type map conflict handling.
    pub conflict_policy: ConflictPolicy,
    /// Directory for persistent introspection caches. `None` keeps them
    /// in memory.
    pub cache_dir: Option<PathBuf>,
    /// Allow a later definition to replace an earlier one with the same
    /// name.
    pub allow_override: bool,
}

impl Settings {
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Opens the cache store these settings describe.
    pub fn cache_store(&self) -> Arc<dyn CacheStore> {
        match self.cache_dir {
            Some(ref dir) => Arc::new(FileCache::new(dir.clone())),
            None => Arc::new(MemoryCache::new()),
        }
    }
}
