//! Platform abstraction layer.
//!
//! All `#[cfg]` blocks for OS-specific library lookup live here rather than
//! being scattered through the discovery code.
//!
//! # Supported Platforms
//!
//! - **macOS**: `.dylib` and `.so`, Homebrew prefix plus the Unix directories
//! - **Linux / other Unix**: `.so`, `/usr/local/lib`, `/usr/lib`, `/lib`
//! - **Windows**: `.dll`, no system directories
//! - Anything else: no extensions and no system directories; only the bare
//!   library name is probed

pub mod paths;

pub use paths::{executable_dirs, library_extensions, system_library_dirs, ExecutableDirs};

/// Returns the current platform name.
pub fn current_platform() -> &'static str {
    #[cfg(target_os = "linux")]
    {
        "linux"
    }
    #[cfg(target_os = "windows")]
    {
        "windows"
    }
    #[cfg(target_os = "macos")]
    {
        "macos"
    }
    #[cfg(all(unix, not(any(target_os = "linux", target_os = "macos"))))]
    {
        "unix"
    }
    #[cfg(not(any(unix, target_os = "windows")))]
    {
        "unknown"
    }
}

/// Returns true if the platform has a compiled-in extension table.
pub fn is_supported_platform() -> bool {
    !library_extensions().is_empty()
}
