//! Show where the sqlite3_pcre2 library is searched for and try to load it.
//!
//! Run with: cargo run --example probe [LIBRARY_PATH]
//!
//! Set `RUST_LOG=debug` to see every candidate the hook tries.

use sqlite3_pcre2::{ConnectHook, Driver, SearchConfig};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> sqlite3_pcre2::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let mut config = SearchConfig::new().with_working_directory(true);
    if let Some(path) = std::env::args_os().nth(1) {
        config.set_library_path(Some(path.into()));
    }

    let hook = ConnectHook::new(config.clone());
    println!("Search paths:");
    for path in hook.search_paths() {
        println!("  {}", path.display());
    }

    match hook.candidates() {
        Ok(candidates) => {
            println!("Candidates:");
            for path in candidates.iter() {
                println!("  {}", path.display());
            }
        }
        Err(e) => {
            error!("{}", e);
            return Err(e);
        }
    }

    let conn = Driver::pcre2(config).open_in_memory()?;
    let matched: bool = conn.query_row(
        r"SELECT 'sqlite3_pcre2' REGEXP '^sqlite\d_pcre\d$'",
        [],
        |row| row.get(0),
    )?;
    info!("REGEXP loaded, test match: {}", matched);
    Ok(())
}
