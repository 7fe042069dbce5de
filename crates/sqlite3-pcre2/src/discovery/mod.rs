//! Shared library discovery.
//!
//! - `resolver` - turns a [`SearchConfig`](crate::SearchConfig) into ordered search paths
//! - `locator` - turns search paths into existing library files
//! - `cache` - memoizes locator results per distinct input

pub mod cache;
pub mod locator;
pub mod resolver;

pub use cache::{CacheKey, CandidateLibraries, DiscoveryCache, DiscoveryStats};
pub use locator::{EntryKind, FileProbe, LibraryLocator, OsFileProbe};
pub use resolver::{resolve_search_paths, search_paths, SearchEnvironment};
