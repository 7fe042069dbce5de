//! Platform-specific library extensions and search directories.
//!
//! This module provides:
//! - The file extensions a shared library may carry
//! - The well-known system library directories
//! - The (memoized) directory of the running executable

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Shared library file extensions, in probe order.
///
/// # Platform Behavior
/// - **macOS**: `.dylib`, then `.so`
/// - **Linux/Unix**: `.so`
/// - **Windows**: `.dll`
/// - **Other**: none
pub fn library_extensions() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &[".dylib", ".so"]
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        &[".so"]
    }
    #[cfg(windows)]
    {
        &[".dll"]
    }
    #[cfg(not(any(unix, windows)))]
    {
        &[]
    }
}

/// Well-known system library directories, in search order.
///
/// # Platform Behavior
/// - **macOS**: `/opt/homebrew/lib`, `/usr/local/lib`, `/usr/lib`, `/lib`
/// - **Linux/Unix**: `/usr/local/lib`, `/usr/lib`, `/lib`
/// - **Windows/Other**: none
pub fn system_library_dirs() -> &'static [&'static str] {
    #[cfg(target_os = "macos")]
    {
        &["/opt/homebrew/lib", "/usr/local/lib", "/usr/lib", "/lib"]
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        &["/usr/local/lib", "/usr/lib", "/lib"]
    }
    #[cfg(not(unix))]
    {
        &[]
    }
}

/// Directory of the running executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutableDirs {
    /// Directory containing the executable as invoked.
    pub dir: Option<PathBuf>,
    /// `dir` with symlinks resolved. `None` if identical to `dir` or if
    /// resolution failed.
    pub resolved_dir: Option<PathBuf>,
}

impl ExecutableDirs {
    /// Build from an executable path. Non-absolute paths contribute nothing.
    pub fn from_executable(exe: &Path) -> Self {
        let Some(dir) = exe.parent().and_then(require_absolute) else {
            return Self::default();
        };
        let resolved_dir = std::fs::canonicalize(&dir)
            .ok()
            .as_deref()
            .and_then(require_absolute)
            .filter(|resolved| *resolved != dir);
        Self {
            dir: Some(dir),
            resolved_dir,
        }
    }

    /// The directories in search order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.dir.iter().chain(self.resolved_dir.iter())
    }
}

static EXECUTABLE_DIRS: OnceLock<ExecutableDirs> = OnceLock::new();

/// Directory of the running executable, resolved once per process.
///
/// Failures leave both fields empty.
pub fn executable_dirs() -> &'static ExecutableDirs {
    EXECUTABLE_DIRS.get_or_init(|| match std::env::current_exe() {
        Ok(exe) => {
            let dirs = ExecutableDirs::from_executable(&exe);
            debug!("Executable directories: {:?}", dirs);
            dirs
        }
        Err(e) => {
            debug!("Could not determine executable path: {}", e);
            ExecutableDirs::default()
        }
    })
}

/// Clean `path` and return it only if it is absolute.
pub(crate) fn require_absolute(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() || !path.is_absolute() {
        return None;
    }
    Some(path.components().collect())
}
