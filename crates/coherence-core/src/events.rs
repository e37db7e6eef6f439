use serde::{Deserialize, Serialize};

use crate::cycle::BreathPhase;

/// Every state change of the cycle controller produces an Event.
/// The orchestrator consumes them to count breaths and render progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CycleEvent {
    /// Entered a new phase. The first event of every session is `Inhale` at 0.
    PhaseChanged { phase: BreathPhase, elapsed_ms: u64 },
    /// Countdown tick.
    Tick { remaining_ms: u64, elapsed_ms: u64 },
    /// The total duration ran out. Distinct from a user stop.
    Completed { elapsed_ms: u64 },
    /// The session was stopped by the user before running out.
    Stopped { elapsed_ms: u64 },
}

impl CycleEvent {
    /// True for the two events that end a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CycleEvent::Completed { .. } | CycleEvent::Stopped { .. })
    }

    pub fn elapsed_ms(&self) -> u64 {
        match *self {
            CycleEvent::PhaseChanged { elapsed_ms, .. }
            | CycleEvent::Tick { elapsed_ms, .. }
            | CycleEvent::Completed { elapsed_ms }
            | CycleEvent::Stopped { elapsed_ms } => elapsed_ms,
        }
    }
}
