//! Per-connection extension loading.
//!
//! [`ConnectHook::run`] is invoked once for every new connection. It resolves
//! the search paths, asks the [`DiscoveryCache`] for candidate libraries and
//! loads the first one that SQLite accepts.

use crate::config::{LibraryConfig, SearchConfig};
use crate::discovery::{
    resolve_search_paths, CandidateLibraries, DiscoveryCache, LibraryLocator, SearchEnvironment,
};
use crate::error::{Pcre2Error, Result};
use rusqlite::{Connection, LoadExtensionGuard};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Loads a shared library into a connection as a SQLite extension.
pub trait ExtensionLoader: Send + Sync {
    fn load_extension(
        &self,
        conn: &Connection,
        library: &Path,
        entry_point: &str,
    ) -> rusqlite::Result<()>;
}

/// [`ExtensionLoader`] using `sqlite3_load_extension`.
///
/// Extension loading is enabled only for the duration of the call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteExtensionLoader;

impl ExtensionLoader for SqliteExtensionLoader {
    #[allow(unsafe_code)]
    fn load_extension(
        &self,
        conn: &Connection,
        library: &Path,
        entry_point: &str,
    ) -> rusqlite::Result<()> {
        // SAFETY: loading an extension runs arbitrary native code from
        // `library`. Candidates only come from the configured search paths,
        // and the working directory is excluded unless explicitly enabled.
        // The guard disables extension loading again when dropped.
        unsafe {
            let _guard = LoadExtensionGuard::new(conn)?;
            conn.load_extension(library, Some(entry_point))
        }
    }
}

/// Finds the `sqlite3_pcre2` library and loads it into connections.
#[derive(Clone)]
pub struct ConnectHook {
    config: Arc<SearchConfig>,
    environment: Option<Arc<SearchEnvironment>>,
    locator: LibraryLocator,
    cache: Arc<DiscoveryCache>,
    loader: Arc<dyn ExtensionLoader>,
}

impl fmt::Debug for ConnectHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectHook")
            .field("config", &self.config)
            .field("environment", &self.environment)
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl Default for ConnectHook {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl ConnectHook {
    /// Hook using the process-wide cache and the live process environment.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config: Arc::new(config),
            environment: None,
            locator: LibraryLocator::new(),
            cache: DiscoveryCache::global(),
            loader: Arc::new(SqliteExtensionLoader),
        }
    }

    /// Resolve against a fixed environment instead of the live process.
    pub fn with_environment(mut self, environment: SearchEnvironment) -> Self {
        self.environment = Some(Arc::new(environment));
        self
    }

    pub fn with_locator(mut self, locator: LibraryLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_cache(mut self, cache: Arc<DiscoveryCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_loader(mut self, loader: Arc<dyn ExtensionLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search paths in priority order.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        match &self.environment {
            Some(env) => resolve_search_paths(&self.config, env),
            None => resolve_search_paths(&self.config, &SearchEnvironment::current()),
        }
    }

    /// Library files in load order.
    ///
    /// # Errors
    /// [`Pcre2Error::LibraryNotFound`] if no library file exists.
    pub fn candidates(&self) -> Result<CandidateLibraries> {
        let paths = self.search_paths();
        self.cache
            .find(&self.locator, &paths)
            .map_err(|_| Pcre2Error::LibraryNotFound)
    }

    /// Load the extension into `conn` and return the library that was used.
    ///
    /// Candidates are tried strictly in order; the first successful load
    /// wins.
    ///
    /// # Errors
    /// [`Pcre2Error::LibraryNotFound`] if there are no candidates or none of
    /// them load.
    pub fn run(&self, conn: &Connection) -> Result<PathBuf> {
        let libraries = self.candidates()?;
        for library in libraries.iter() {
            match self
                .loader
                .load_extension(conn, library, LibraryConfig::ENTRY_POINT)
            {
                Ok(()) => {
                    debug!("Loaded {} from {}", LibraryConfig::LIBRARY_NAME, library.display());
                    return Ok(library.clone());
                }
                Err(e) => {
                    // TODO: return these with the error once callers can match
                    // on something richer than LibraryNotFound.
                    warn!("Failed to load extension {}: {}", library.display(), e);
                }
            }
        }
        debug!("None of {} candidates could be loaded", libraries.len());
        Err(Pcre2Error::LibraryNotFound)
    }
}

/// Load the extension into a connection opened outside the driver registry,
/// with the default [`SearchConfig`].
pub fn connect_hook(conn: &Connection) -> Result<PathBuf> {
    ConnectHook::default().run(conn)
}
