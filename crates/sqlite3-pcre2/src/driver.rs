//! Named SQLite drivers with a per-connection setup hook.
//!
//! A [`Driver`] opens a rusqlite [`Connection`] and runs its setup callback
//! before handing the connection out. If the callback fails the connection is
//! closed and the callback's error is returned unchanged. Drivers are looked
//! up by name in a [`DriverRegistry`]; the process-wide registry is what
//! [`open`] and [`register_pcre2_driver`] use.

use crate::config::{LibraryConfig, SearchConfig};
use crate::error::{Pcre2Error, Result};
use crate::hook::ConnectHook;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockWriteGuard};
use tracing::{debug, info};

/// Callback run on every new connection.
pub type SetupFn = dyn Fn(&Connection) -> Result<()> + Send + Sync;

/// A named connection factory.
#[derive(Clone)]
pub struct Driver {
    name: String,
    setup: Arc<SetupFn>,
    flags: OpenFlags,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl Driver {
    pub fn new<F>(name: impl Into<String>, setup: F) -> Self
    where
        F: Fn(&Connection) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            setup: Arc::new(setup),
            flags: OpenFlags::default(),
        }
    }

    /// The `sqlite3_pcre2` driver: loads the extension on every connection.
    pub fn pcre2(config: SearchConfig) -> Self {
        Self::with_hook(LibraryConfig::DRIVER_NAME, ConnectHook::new(config))
    }

    /// A driver under `name` running `hook` on every connection.
    pub fn with_hook(name: impl Into<String>, hook: ConnectHook) -> Self {
        Self::new(name, move |conn| hook.run(conn).map(|_| ()))
    }

    pub fn with_open_flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open the database at `path` and run the setup callback.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Connection> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(path, self.flags).map_err(|e| {
            Pcre2Error::Database {
                message: format!("Failed to open {}: {}", path.display(), e),
                source: Some(e),
            }
        })?;
        self.setup_connection(conn)
    }

    /// Open an in-memory database and run the setup callback.
    pub fn open_in_memory(&self) -> Result<Connection> {
        let conn = Connection::open_in_memory_with_flags(self.flags)?;
        self.setup_connection(conn)
    }

    fn setup_connection(&self, conn: Connection) -> Result<Connection> {
        (self.setup)(&conn)?;
        debug!("Driver {} opened connection", self.name);
        Ok(conn)
    }
}

static GLOBAL_REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(DriverRegistry::new);

/// Thread-safe map of driver names to drivers.
#[derive(Debug, Default)]
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Driver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static DriverRegistry {
        &GLOBAL_REGISTRY
    }

    /// Register `driver` under its name.
    ///
    /// # Errors
    /// [`Pcre2Error::DuplicateDriver`] if the name is taken. This is a
    /// configuration error and should abort initialization.
    pub fn register(&self, driver: Driver) -> Result<()> {
        let mut drivers = self.write();
        if drivers.contains_key(driver.name()) {
            return Err(Pcre2Error::DuplicateDriver {
                name: driver.name().to_string(),
            });
        }
        info!("Registered SQLite driver {}", driver.name());
        drivers.insert(driver.name().to_string(), driver);
        Ok(())
    }

    /// Register `driver` unless its name is taken. Returns true if it was
    /// added.
    pub fn register_if_absent(&self, driver: Driver) -> bool {
        let mut drivers = self.write();
        if drivers.contains_key(driver.name()) {
            return false;
        }
        info!("Registered SQLite driver {}", driver.name());
        drivers.insert(driver.name().to_string(), driver);
        true
    }

    pub fn get(&self, name: &str) -> Option<Driver> {
        self.drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered driver names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .drivers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Open `path` through the driver registered as `name`.
    pub fn open(&self, name: &str, path: impl AsRef<Path>) -> Result<Connection> {
        self.driver(name)?.open(path)
    }

    /// Open an in-memory database through the driver registered as `name`.
    pub fn open_in_memory(&self, name: &str) -> Result<Connection> {
        self.driver(name)?.open_in_memory()
    }

    fn driver(&self, name: &str) -> Result<Driver> {
        self.get(name).ok_or_else(|| Pcre2Error::UnknownDriver {
            name: name.to_string(),
        })
    }

    // A single insert is the only mutation, so a poisoned map is still consistent.
    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Driver>> {
        self.drivers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Register the `sqlite3_pcre2` driver with the default search
/// configuration in the process-wide registry.
///
/// Does nothing if a driver of that name is already registered, so it is safe
/// to call from every entry point.
pub fn register_pcre2_driver() {
    DriverRegistry::global().register_if_absent(Driver::pcre2(SearchConfig::default()));
}

/// Open `path` with the `sqlite3_pcre2` extension loaded.
pub fn open(path: impl AsRef<Path>) -> Result<Connection> {
    register_pcre2_driver();
    DriverRegistry::global().open(LibraryConfig::DRIVER_NAME, path)
}

/// Open an in-memory database with the `sqlite3_pcre2` extension loaded.
pub fn open_in_memory() -> Result<Connection> {
    register_pcre2_driver();
    DriverRegistry::global().open_in_memory(LibraryConfig::DRIVER_NAME)
}
