//! Centralized configuration for sqlite3-pcre2.
//!
//! [`LibraryConfig`] holds the fixed names shared with the native library and
//! the driver registry. [`SearchConfig`] holds the knobs that change where the
//! library is searched for. A `SearchConfig` is handed to a driver or
//! [`ConnectHook`](crate::ConnectHook) by value and is immutable afterwards.

use crate::error::{Pcre2Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed identifiers.
pub struct LibraryConfig;

impl LibraryConfig {
    /// Name the driver is registered under in the [`DriverRegistry`](crate::DriverRegistry).
    pub const DRIVER_NAME: &'static str = "sqlite3_pcre2";
    /// Base name of the shared library, without extension.
    pub const LIBRARY_NAME: &'static str = "sqlite3_pcre2";
    /// Environment variable holding the library path, its directory, or a
    /// path-list of either. Entries must be absolute.
    pub const ENV_KEY: &'static str = "SQLITE3_PCRE2_LIBRARY";
    /// Symbol SQLite calls to initialize the extension.
    pub const ENTRY_POINT: &'static str = "sqlite3_sqlitepcre_init";
}

/// Where to search for the shared library.
///
/// The default searches the environment variable, the executable's
/// directory and the platform library directories. The current working
/// directory is never searched unless explicitly enabled, since a writable
/// working directory can be used to plant a malicious library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SearchConfig {
    /// Library file or directory (or a path-list of either). When set, it is
    /// the only location searched. Relative paths are resolved against the
    /// working directory.
    pub library_path: Option<PathBuf>,
    /// Replaces the executable and platform directories.
    pub search_paths: Option<Vec<PathBuf>>,
    /// Append the current working directory to the search.
    pub search_working_directory: bool,
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_search_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_paths = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_working_directory(mut self, search: bool) -> Self {
        self.search_working_directory = search;
        self
    }

    /// Set or clear the library path override.
    pub fn set_library_path(&mut self, path: Option<PathBuf>) {
        self.library_path = path;
    }

    /// Toggle the working directory search and return the previous state.
    pub fn search_working_directory(&mut self, search: bool) -> bool {
        std::mem::replace(&mut self.search_working_directory, search)
    }

    /// True if a non-empty library path override is set.
    pub fn has_library_path(&self) -> bool {
        self.library_path
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
    }

    /// Load a search configuration from a JSON file.
    ///
    /// Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| Pcre2Error::io_with_path(e, path))?;

        let config: SearchConfig =
            serde_json::from_str(&content).map_err(|e| Pcre2Error::Json {
                message: format!(
                    "Failed to parse search config from {}: {}",
                    path.display(),
                    e
                ),
                source: Some(e),
            })?;

        if config
            .search_paths
            .as_ref()
            .is_some_and(|paths| paths.is_empty())
        {
            return Err(Pcre2Error::Config {
                message: format!(
                    "Search config in {} has an empty search_paths list",
                    path.display()
                ),
            });
        }

        debug!("Loaded search config from {}", path.display());
        Ok(config)
    }
}
