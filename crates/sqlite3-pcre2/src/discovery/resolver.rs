//! Search path resolution.
//!
//! Search order:
//!
//! 1. [`SearchConfig::library_path`], a file, directory or path-list. If set
//!    the search ends here.
//! 2. The `SQLITE3_PCRE2_LIBRARY` environment variable (absolute entries only).
//! 3. The directory of the running executable, and the same directory with
//!    symlinks resolved when that differs.
//! 4. The platform library directories.
//! 5. The current working directory, if enabled.
//!
//! [`SearchConfig::search_paths`] replaces 3 and 4.

use crate::config::{LibraryConfig, SearchConfig};
use crate::platform::{self, paths::require_absolute, ExecutableDirs};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Process inputs the resolver reads.
///
/// [`SearchEnvironment::current`] snapshots the live process; tests build one
/// by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchEnvironment {
    /// Raw value of the `SQLITE3_PCRE2_LIBRARY` variable.
    pub env_library: Option<OsString>,
    pub executable: ExecutableDirs,
    pub working_dir: Option<PathBuf>,
    pub system_dirs: Vec<PathBuf>,
}

impl SearchEnvironment {
    pub fn current() -> Self {
        Self {
            env_library: std::env::var_os(LibraryConfig::ENV_KEY),
            executable: platform::executable_dirs().clone(),
            working_dir: std::env::current_dir().ok(),
            system_dirs: platform::system_library_dirs()
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

/// Search paths for the live process.
pub fn search_paths(config: &SearchConfig) -> Vec<PathBuf> {
    resolve_search_paths(config, &SearchEnvironment::current())
}

/// Search paths for `config` against an explicit environment.
///
/// Empty entries are dropped. Relative entries in the library path override
/// and in explicit search paths are joined onto the working directory, so the
/// result names the same locations however the process moves afterwards.
pub fn resolve_search_paths(config: &SearchConfig, env: &SearchEnvironment) -> Vec<PathBuf> {
    let working_dir = env.working_dir.as_deref();

    if let Some(library_path) = config.library_path.as_ref().filter(|_| config.has_library_path()) {
        return std::env::split_paths(library_path)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| anchor(p, working_dir))
            .collect();
    }

    let mut paths = Vec::with_capacity(8);

    if let Some(value) = env.env_library.as_ref().filter(|v| !v.is_empty()) {
        paths.extend(std::env::split_paths(value).filter_map(|p| require_absolute(&p)));
    }

    match &config.search_paths {
        Some(explicit) => paths.extend(
            explicit
                .iter()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| anchor(p.clone(), working_dir)),
        ),
        None => {
            paths.extend(env.executable.iter().cloned());
            paths.extend(env.system_dirs.iter().cloned());
        }
    }

    if config.search_working_directory {
        if let Some(wd) = &env.working_dir {
            paths.push(wd.clone());
        }
    }

    paths.retain(|p| !p.as_os_str().is_empty());
    paths
}

/// Join a relative `path` onto `working_dir`. Without a working directory the
/// path is left for the locator to resolve.
fn anchor(path: PathBuf, working_dir: Option<&Path>) -> PathBuf {
    match working_dir {
        Some(wd) if path.is_relative() => wd.join(path),
        _ => path,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn test_env() -> SearchEnvironment {
        SearchEnvironment {
            env_library: None,
            executable: ExecutableDirs {
                dir: Some(PathBuf::from("/opt/app/bin")),
                resolved_dir: Some(PathBuf::from("/opt/app/releases/1/bin")),
            },
            working_dir: Some(PathBuf::from("/home/user/project")),
            system_dirs: vec![PathBuf::from("/usr/local/lib"), PathBuf::from("/usr/lib")],
        }
    }

    fn as_strs(paths: &[PathBuf]) -> Vec<&str> {
        paths.iter().map(|p| p.to_str().unwrap()).collect()
    }

    #[test]
    fn test_default_order() {
        let paths = resolve_search_paths(&SearchConfig::default(), &test_env());
        assert_eq!(
            as_strs(&paths),
            vec![
                "/opt/app/bin",
                "/opt/app/releases/1/bin",
                "/usr/local/lib",
                "/usr/lib"
            ]
        );
    }

    #[test]
    fn test_library_path_overrides_everything() {
        let mut env = test_env();
        env.env_library = Some("/from/env".into());
        let config = SearchConfig::new()
            .with_library_path("/pinned/sqlite3_pcre2.so")
            .with_search_paths(["/explicit"])
            .with_working_directory(true);

        let paths = resolve_search_paths(&config, &env);
        assert_eq!(as_strs(&paths), vec!["/pinned/sqlite3_pcre2.so"]);
    }

    #[test]
    fn test_library_path_list_anchors_relative_entries() {
        let config = SearchConfig::new().with_library_path("/first::lib/relative");
        let paths = resolve_search_paths(&config, &test_env());
        assert_eq!(
            as_strs(&paths),
            vec!["/first", "/home/user/project/lib/relative"]
        );
    }

    #[test]
    fn test_relative_entries_follow_working_dir() {
        let config = SearchConfig::new().with_library_path("lib");
        let mut env = test_env();
        let in_project = resolve_search_paths(&config, &env);

        env.working_dir = Some(PathBuf::from("/srv/other"));
        let in_other = resolve_search_paths(&config, &env);

        assert_eq!(as_strs(&in_project), vec!["/home/user/project/lib"]);
        assert_eq!(as_strs(&in_other), vec!["/srv/other/lib"]);

        env.working_dir = None;
        assert_eq!(as_strs(&resolve_search_paths(&config, &env)), vec!["lib"]);
    }

    #[test]
    fn test_explicit_relative_search_paths_are_anchored() {
        let config = SearchConfig::new().with_search_paths(["vendor/lib", "/abs"]);
        let paths = resolve_search_paths(&config, &test_env());
        assert_eq!(
            as_strs(&paths),
            vec!["/home/user/project/vendor/lib", "/abs"]
        );
    }

    #[test]
    fn test_empty_library_path_is_unset() {
        let config = SearchConfig::new().with_library_path("");
        let paths = resolve_search_paths(&config, &test_env());
        assert_eq!(paths.first().map(PathBuf::as_path), Some(Path::new("/opt/app/bin")));
    }

    #[test]
    fn test_env_var_precedes_executable_dir() {
        let mut env = test_env();
        env.env_library = Some("/env/a:relative/b::/env//c/".into());

        let paths = resolve_search_paths(&SearchConfig::default(), &env);
        assert_eq!(&as_strs(&paths)[..3], &["/env/a", "/env/c", "/opt/app/bin"]);
    }

    #[test]
    fn test_missing_executable_dirs_are_omitted() {
        let mut env = test_env();
        env.executable = ExecutableDirs::default();

        let paths = resolve_search_paths(&SearchConfig::default(), &env);
        assert_eq!(as_strs(&paths), vec!["/usr/local/lib", "/usr/lib"]);
    }

    #[test]
    fn test_search_paths_replace_default_set() {
        let mut env = test_env();
        env.env_library = Some("/from/env".into());
        let config = SearchConfig::new()
            .with_search_paths(["/custom/one", "", "/custom/two"])
            .with_working_directory(true);

        let paths = resolve_search_paths(&config, &env);
        assert_eq!(
            as_strs(&paths),
            vec!["/from/env", "/custom/one", "/custom/two", "/home/user/project"]
        );
    }

    #[test]
    fn test_working_directory_opt_in() {
        let env = test_env();
        let off = resolve_search_paths(&SearchConfig::default(), &env);
        assert!(!off.contains(&PathBuf::from("/home/user/project")));

        let on = resolve_search_paths(&SearchConfig::new().with_working_directory(true), &env);
        assert_eq!(on.last().map(PathBuf::as_path), Some(Path::new("/home/user/project")));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let config = SearchConfig::new().with_working_directory(true);
        let env = test_env();
        assert_eq!(
            resolve_search_paths(&config, &env),
            resolve_search_paths(&config, &env)
        );
    }
}
