//! Persistence for the session log and configuration.
//!
//! The statistics engine only sees the [`SessionStore`] trait. Two backends
//! ship with the crate: [`MemoryStore`] for tests and dry runs, and
//! [`SqliteStore`] for the CLI.

mod config;
mod memory;
mod sqlite;

pub use config::{Config, SessionConfig};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use crate::error::StoreError;
use crate::session::SessionRecord;

/// Load/save collaborator for the session log.
///
/// `save` always receives the whole log, in log order.
pub trait SessionStore {
    fn load(&self) -> Result<Vec<SessionRecord>, StoreError>;
    fn save(&mut self, records: &[SessionRecord]) -> Result<(), StoreError>;
}

/// Returns the data directory, creating it if needed.
///
/// `COHERENCE_DATA_DIR` wins when set. Otherwise `~/.config/coherence`, or
/// `~/.config/coherence-dev` when `COHERENCE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("COHERENCE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("COHERENCE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("coherence-dev")
            } else {
                base_dir.join("coherence")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
