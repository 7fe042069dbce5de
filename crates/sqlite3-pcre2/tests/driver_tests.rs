//! Driver registration and connection setup through the public API.
//!
//! None of these need the real extension: library files are placeholders and
//! loading goes through a stub [`ExtensionLoader`] or is expected to fail.

use rusqlite::Connection;
use sqlite3_pcre2::{
    ConnectHook, DiscoveryCache, Driver, DriverRegistry, ExtensionLoader, LibraryConfig,
    LibraryLocator, Pcre2Error, SearchConfig, SearchEnvironment,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Accepts only libraries inside a directory whose name starts with `good`.
#[derive(Default)]
struct PickyLoader {
    attempts: Mutex<Vec<PathBuf>>,
}

impl ExtensionLoader for PickyLoader {
    fn load_extension(
        &self,
        _conn: &Connection,
        library: &Path,
        _entry_point: &str,
    ) -> rusqlite::Result<()> {
        self.attempts.lock().unwrap().push(library.to_path_buf());
        let good = library
            .parent()
            .and_then(|dir| dir.file_name())
            .is_some_and(|name| name.to_string_lossy().starts_with("good"));
        if good {
            Ok(())
        } else {
            Err(rusqlite::Error::InvalidPath(library.to_path_buf()))
        }
    }
}

fn library_dir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir(&dir).unwrap();
    std::fs::write(dir.join("sqlite3_pcre2.so"), b"placeholder").unwrap();
    dir
}

fn isolated_hook(config: SearchConfig, loader: Arc<PickyLoader>) -> ConnectHook {
    ConnectHook::new(config)
        .with_environment(SearchEnvironment::default())
        .with_locator(LibraryLocator::with_library("sqlite3_pcre2", [".so"]))
        .with_cache(Arc::new(DiscoveryCache::new()))
        .with_loader(loader)
}

#[test]
fn test_missing_override_fails_open() {
    let temp_dir = TempDir::new().unwrap();
    let registry = DriverRegistry::new();
    registry
        .register(Driver::pcre2(
            SearchConfig::new().with_library_path(temp_dir.path().join("nonexistent")),
        ))
        .unwrap();

    let err = registry
        .open(LibraryConfig::DRIVER_NAME, temp_dir.path().join("test.db"))
        .unwrap_err();
    assert!(matches!(err, Pcre2Error::LibraryNotFound));
    assert_eq!(
        err.to_string(),
        "pcre2: could not find sqlite3_pcre2 shared library"
    );
}

#[test]
fn test_duplicate_driver_name() {
    let registry = DriverRegistry::new();
    registry
        .register(Driver::pcre2(SearchConfig::default()))
        .unwrap();

    let err = registry
        .register(Driver::new(LibraryConfig::DRIVER_NAME, |_conn| Ok(())))
        .unwrap_err();
    assert!(matches!(err, Pcre2Error::DuplicateDriver { .. }));
}

#[test]
fn test_first_working_candidate_is_used() {
    let root = TempDir::new().unwrap();
    let good = library_dir(root.path(), "good");
    let bad = library_dir(root.path(), "bad");
    let loader = Arc::new(PickyLoader::default());
    let config = SearchConfig::new().with_search_paths([good.clone(), bad.clone()]);

    let driver = Driver::with_hook("picky", isolated_hook(config, loader.clone()));
    let conn = driver.open_in_memory().unwrap();
    conn.execute_batch("SELECT 1").unwrap();

    assert_eq!(
        *loader.attempts.lock().unwrap(),
        vec![good.join("sqlite3_pcre2.so")]
    );
}

#[test]
fn test_falls_through_corrupt_candidate() {
    let root = TempDir::new().unwrap();
    let bad = library_dir(root.path(), "bad");
    let good = library_dir(root.path(), "good");
    let loader = Arc::new(PickyLoader::default());
    let config = SearchConfig::new().with_search_paths([bad.clone(), good.clone()]);

    let hook = isolated_hook(config, loader.clone());
    let conn = Connection::open_in_memory().unwrap();
    assert_eq!(hook.run(&conn).unwrap(), good.join("sqlite3_pcre2.so"));
    assert_eq!(
        *loader.attempts.lock().unwrap(),
        vec![bad.join("sqlite3_pcre2.so"), good.join("sqlite3_pcre2.so")]
    );
}

#[test]
fn test_hook_failure_closes_connection() {
    let root = TempDir::new().unwrap();
    let bad = library_dir(root.path(), "bad");
    let loader = Arc::new(PickyLoader::default());
    let config = SearchConfig::new().with_search_paths([bad]);

    let registry = DriverRegistry::new();
    registry
        .register(Driver::with_hook("picky", isolated_hook(config, loader)))
        .unwrap();

    let err = registry.open_in_memory("picky").unwrap_err();
    assert!(err.is_library_not_found());
}

#[test]
fn test_working_directory_search() {
    let wd = TempDir::new().unwrap();
    let lib = wd.path().join("sqlite3_pcre2.so");
    std::fs::write(&lib, b"placeholder").unwrap();
    let environment = SearchEnvironment {
        working_dir: Some(wd.path().to_path_buf()),
        ..SearchEnvironment::default()
    };

    let mut config = SearchConfig::default();
    let hook = ConnectHook::new(config.clone())
        .with_environment(environment.clone())
        .with_locator(LibraryLocator::with_library("sqlite3_pcre2", [".so"]))
        .with_cache(Arc::new(DiscoveryCache::new()));
    assert!(hook.candidates().unwrap_err().is_library_not_found());

    assert!(!config.search_working_directory(true));
    let hook = ConnectHook::new(config)
        .with_environment(environment)
        .with_locator(LibraryLocator::with_library("sqlite3_pcre2", [".so"]))
        .with_cache(Arc::new(DiscoveryCache::new()));
    assert_eq!(&hook.candidates().unwrap()[..], &[lib]);
}

#[test]
fn test_config_file_drives_search() {
    let root = TempDir::new().unwrap();
    let good = library_dir(root.path(), "good");
    let config_path = root.path().join("pcre2.json");
    std::fs::write(
        &config_path,
        serde_json::json!({ "search_paths": [&good] }).to_string(),
    )
    .unwrap();

    let config = SearchConfig::from_json_file(&config_path).unwrap();
    let hook = isolated_hook(config, Arc::new(PickyLoader::default()));
    assert_eq!(
        &hook.candidates().unwrap()[..],
        &[good.join("sqlite3_pcre2.so")]
    );
}
