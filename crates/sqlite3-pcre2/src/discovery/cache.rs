//! Memoized library discovery.
//!
//! Results are keyed by the library name, the exact ordered search paths and
//! the extension set. Only successful lookups are stored, so a library installed after a
//! failed lookup is picked up on the next attempt. Entries live for the
//! lifetime of the cache; the global cache lives for the process.

use super::locator::LibraryLocator;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

/// Ordered library files found for one set of discovery inputs.
pub type CandidateLibraries = Arc<[PathBuf]>;

/// Canonical encoding of discovery inputs.
///
/// The library name comes first and is NUL terminated. Each path is followed
/// by a NUL byte, then a lone NUL separates the paths from the extensions,
/// each of which is also NUL terminated. NUL can't appear in a path, so
/// distinct ordered inputs never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<u8>);

impl CacheKey {
    pub fn new<P, E>(library_name: &str, paths: &[P], extensions: &[E]) -> Self
    where
        P: AsRef<Path>,
        E: AsRef<str>,
    {
        let size = paths
            .iter()
            .map(|p| p.as_ref().as_os_str().len() + 1)
            .chain(extensions.iter().map(|e| e.as_ref().len() + 1))
            .sum::<usize>()
            + library_name.len()
            + 2;
        let mut key = Vec::with_capacity(size);
        key.extend_from_slice(library_name.as_bytes());
        key.push(0);
        for path in paths {
            key.extend_from_slice(path.as_ref().as_os_str().as_encoded_bytes());
            key.push(0);
        }
        key.push(0);
        for ext in extensions {
            key.extend_from_slice(ext.as_ref().as_bytes());
            key.push(0);
        }
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

static GLOBAL_CACHE: LazyLock<Arc<DiscoveryCache>> =
    LazyLock::new(|| Arc::new(DiscoveryCache::new()));

/// Thread-safe memo of [`LibraryLocator::locate`] results.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: RwLock<HashMap<CacheKey, CandidateLibraries>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DiscoveryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache.
    pub fn global() -> Arc<DiscoveryCache> {
        Arc::clone(&GLOBAL_CACHE)
    }

    /// Cached candidates for `search_paths`, running `locator` on a miss.
    ///
    /// Two threads missing on the same key at once may both probe the
    /// filesystem; the last writer wins and both results are identical.
    pub fn find(
        &self,
        locator: &LibraryLocator,
        search_paths: &[PathBuf],
    ) -> Result<CandidateLibraries> {
        let key = CacheKey::new(locator.library_name(), search_paths, locator.extensions());
        if let Some(found) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(found);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let found: CandidateLibraries = locator.locate(search_paths)?.into();
        // Inserts are atomic, so a poisoned map is still consistent.
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&found));
        debug!("Cached {} library candidates", found.len());
        Ok(found)
    }

    /// Stored candidates for `key`, without touching the filesystem.
    pub fn get(&self, key: &CacheKey) -> Option<CandidateLibraries> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> DiscoveryStats {
        DiscoveryStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
