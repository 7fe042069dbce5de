//! Shared library lookup across resolved search paths.

use crate::config::LibraryConfig;
use crate::error::{Pcre2Error, Result};
use crate::platform;
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Kind of a filesystem entry, as far as discovery cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// Filesystem access used by [`LibraryLocator`].
pub trait FileProbe: Send + Sync {
    /// Make `path` absolute against the current working directory.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;

    /// Stat `path`, following symlinks.
    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind>;
}

/// [`FileProbe`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileProbe;

impl FileProbe for OsFileProbe {
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        std::path::absolute(path)
    }

    fn entry_kind(&self, path: &Path) -> io::Result<EntryKind> {
        let metadata = std::fs::metadata(path)?;
        Ok(if metadata.is_file() {
            EntryKind::File
        } else if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        })
    }
}

/// Finds library files for a base name and extension set.
#[derive(Clone)]
pub struct LibraryLocator {
    library_name: String,
    extensions: Vec<String>,
    probe: Arc<dyn FileProbe>,
}

impl fmt::Debug for LibraryLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryLocator")
            .field("library_name", &self.library_name)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl Default for LibraryLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl LibraryLocator {
    /// Locator for `sqlite3_pcre2` with the platform extensions.
    pub fn new() -> Self {
        Self::with_library(
            LibraryConfig::LIBRARY_NAME,
            platform::library_extensions().iter().copied(),
        )
    }

    pub fn with_library<I, S>(library_name: impl Into<String>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            library_name: library_name.into(),
            extensions: extensions.into_iter().map(Into::into).collect(),
            probe: Arc::new(OsFileProbe),
        }
    }

    /// Replace the filesystem backend.
    pub fn with_probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn library_name(&self) -> &str {
        &self.library_name
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// File names probed inside each directory: the bare name, then the name
    /// with each extension in order.
    pub fn file_names(&self) -> Vec<String> {
        std::iter::once(self.library_name.clone())
            .chain(
                self.extensions
                    .iter()
                    .map(|ext| format!("{}{}", self.library_name, ext)),
            )
            .collect()
    }

    /// Resolve `search_paths` to existing library files.
    ///
    /// Entries that are files are taken as is; directories are probed for
    /// [`file_names`](Self::file_names). Anything that can't be resolved or
    /// stat'd is skipped. The first occurrence of a file wins, so later
    /// search paths never reorder earlier matches.
    ///
    /// # Errors
    /// [`Pcre2Error::LibraryNotFound`] if nothing was found.
    pub fn locate(&self, search_paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let names = self.file_names();
        let mut found = Candidates::default();

        for path in search_paths {
            if path.as_os_str().is_empty() {
                continue;
            }
            let Ok(path) = self.probe.absolute(path) else {
                continue;
            };
            match self.probe.entry_kind(&path) {
                Ok(EntryKind::File) => found.push(path),
                Ok(EntryKind::Directory) => {
                    for name in &names {
                        let candidate = path.join(name);
                        if matches!(self.probe.entry_kind(&candidate), Ok(EntryKind::File)) {
                            found.push(candidate);
                        }
                    }
                }
                Ok(EntryKind::Other) | Err(_) => {
                    trace!("Skipping search path {}", path.display());
                }
            }
        }

        if found.paths.is_empty() {
            debug!(
                "No {} library in {} search paths",
                self.library_name,
                search_paths.len()
            );
            return Err(Pcre2Error::LibraryNotFound);
        }
        debug!("Found {} library candidates: {:?}", found.paths.len(), found.paths);
        Ok(found.paths)
    }
}

/// Ordered, deduplicated candidate list.
#[derive(Default)]
struct Candidates {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl Candidates {
    fn push(&mut self, path: PathBuf) {
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
        }
    }
}
