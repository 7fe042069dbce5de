//! SQLite driver that loads the `sqlite3_pcre2` regular expression extension.
//!
//! Every connection opened through the `sqlite3_pcre2` driver has the
//! extension loaded before it is handed out, which provides the `REGEXP`
//! operator backed by PCRE2. The shared library is found by searching, in
//! order:
//!
//! 1. the explicit library path, if one is configured (nothing else is searched)
//! 2. the `SQLITE3_PCRE2_LIBRARY` environment variable (absolute entries only)
//! 3. the executable's directory, and its symlink-resolved directory
//! 4. the platform's system library directories
//! 5. the current working directory, only when enabled
//!
//! # Example
//!
//! ```rust,no_run
//! fn main() -> sqlite3_pcre2::Result<()> {
//!     let conn = sqlite3_pcre2::open_in_memory()?;
//!     let matched: bool = conn.query_row("SELECT 'abc' REGEXP '^a.c$'", [], |row| row.get(0))?;
//!     assert!(matched);
//!     Ok(())
//! }
//! ```
//!
//! Connections opened some other way can use [`connect_hook`] directly, and
//! [`ConnectHook`] exposes the search paths and candidates for diagnostics.

pub mod config;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod hook;
pub mod platform;

pub use config::{LibraryConfig, SearchConfig};
pub use discovery::{
    resolve_search_paths, search_paths, CacheKey, CandidateLibraries, DiscoveryCache,
    DiscoveryStats, LibraryLocator, SearchEnvironment,
};
pub use driver::{open, open_in_memory, register_pcre2_driver, Driver, DriverRegistry};
pub use error::{Pcre2Error, Result};
pub use hook::{connect_hook, ConnectHook, ExtensionLoader, SqliteExtensionLoader};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_names() {
        assert_eq!(LibraryConfig::DRIVER_NAME, "sqlite3_pcre2");
        assert_eq!(LibraryConfig::ENTRY_POINT, "sqlite3_sqlitepcre_init");
    }
}
