//! # Coherence Core Library
//!
//! Core logic for Coherence, a paced-breathing ("cardiac coherence")
//! practice tool. Everything is available through the standalone CLI
//! binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Cycle controller**: a deterministic state machine driven by
//!   [`BreathingCycleController::advance`], plus an async runner that feeds
//!   it wall-clock deltas from tokio
//! - **Breath counter**: tallies inhales and turns a finished session into a
//!   [`SessionRecord`]
//! - **Statistics**: a bounded session log with period filters, streaks and
//!   longer-term analytics
//! - **Storage**: the [`SessionStore`] seam, with SQLite and in-memory
//!   backends, plus TOML configuration
//!
//! ## Key Components
//!
//! - [`BreathingCycleController`]: inhale/exhale phase machine
//! - [`SessionStatsEngine`]: session log and derived statistics
//! - [`Config`]: application configuration management

pub mod counter;
pub mod cycle;
pub mod error;
pub mod events;
pub mod session;
pub mod stats;
pub mod storage;

pub use counter::{BreathCounter, CounterConfig, RhythmFeedback};
pub use cycle::{run_session, BreathPhase, BreathingCycleController, CycleConfig, CycleState, SessionOutcome};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::CycleEvent;
pub use session::{SessionKind, SessionMetrics, SessionRecord};
pub use stats::{
    ExportBundle, Insight, InsightKind, InsightPriority, Period, QuickSummary, SessionAnalysis,
    SessionStatsEngine, Statistics,
};
pub use storage::{Config, MemoryStore, SessionStore, SqliteStore};
