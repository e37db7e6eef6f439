mod config;
mod controller;
mod runner;

pub use config::{CycleConfig, DEFAULT_PHASE_DURATION_MS, DEFAULT_TICK_INTERVAL_MS, DEFAULT_TOTAL_DURATION_MS};
pub use controller::{BreathPhase, BreathingCycleController, CycleState};
pub use runner::{run_session, SessionOutcome};
