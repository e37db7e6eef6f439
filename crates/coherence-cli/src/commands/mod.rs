pub mod breathe;
pub mod config;
pub mod sessions;
pub mod stats;

use coherence_core::{Config, CoreError, SessionStatsEngine, SqliteStore};

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open the on-disk session log, capped per the loaded config.
pub fn open_engine(config: &Config) -> Result<SessionStatsEngine<SqliteStore>, CoreError> {
    let store = SqliteStore::open()?;
    SessionStatsEngine::with_capacity(store, config.session.max_stored_sessions)
}
