//! Breathing cycle controller.
//!
//! The controller is a deterministic state machine over a virtual timeline.
//! It owns no thread and no timer: the caller feeds it elapsed time through
//! [`BreathingCycleController::advance`], and it replays every phase flip and
//! countdown tick that fell inside that span, in timeline order.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Inhale -> Exhale -> Inhale -> ... -> Idle
//! ```
//!
//! A session leaves the running states either when the countdown reaches
//! zero (`Completed`) or on [`BreathingCycleController::stop`] (`Stopped`).
//!
//! ## Usage
//!
//! ```ignore
//! let mut controller = BreathingCycleController::new();
//! controller.start()?;
//! // In a loop:
//! for event in controller.advance(elapsed_since_last_call_ms) { ... }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::CycleConfig;
use crate::error::Result;
use crate::events::CycleEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreathPhase {
    Idle,
    Inhale,
    Exhale,
}

impl BreathPhase {
    pub fn is_running(&self) -> bool {
        !matches!(self, BreathPhase::Idle)
    }

    fn flipped(self) -> Self {
        match self {
            BreathPhase::Inhale => BreathPhase::Exhale,
            BreathPhase::Exhale => BreathPhase::Inhale,
            BreathPhase::Idle => BreathPhase::Idle,
        }
    }
}

/// Read-only view of the transient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleState {
    pub phase: BreathPhase,
    pub elapsed_ms: u64,
    pub remaining_ms: u64,
}

/// Drives the inhale/exhale cycle for one bounded session at a time.
#[derive(Debug, Clone)]
pub struct BreathingCycleController {
    config: CycleConfig,
    phase: BreathPhase,
    elapsed_ms: u64,
    remaining_ms: u64,
    /// Timeline position of the pending phase flip.
    next_flip_ms: Option<u64>,
    /// Timeline position of the pending countdown tick.
    next_tick_ms: Option<u64>,
}

impl Default for BreathingCycleController {
    fn default() -> Self {
        Self::new()
    }
}

impl BreathingCycleController {
    /// Create an idle controller with the default 5s/5s, 5 minute rhythm.
    pub fn new() -> Self {
        let config = CycleConfig::default();
        Self {
            config,
            phase: BreathPhase::Idle,
            elapsed_ms: 0,
            remaining_ms: config.total_duration_ms,
            next_flip_ms: None,
            next_tick_ms: None,
        }
    }

    /// Create an idle controller with a custom rhythm.
    pub fn with_config(config: CycleConfig) -> Result<Self> {
        config.validate()?;
        let mut controller = Self::new();
        controller.config = config;
        controller.remaining_ms = config.total_duration_ms;
        Ok(controller)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> BreathPhase {
        self.phase
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    pub fn state(&self) -> CycleState {
        CycleState {
            phase: self.phase,
            elapsed_ms: self.elapsed_ms,
            remaining_ms: self.remaining_ms,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a session with the current configuration.
    ///
    /// Returns the initial `PhaseChanged(Inhale)` event, or `None` when a
    /// session is already running.
    pub fn start(&mut self) -> Result<Option<CycleEvent>> {
        let config = self.config;
        self.start_with(config)
    }

    /// Start a session with a new configuration.
    ///
    /// The configuration is validated before anything else so that a
    /// rejected call leaves the controller untouched.
    pub fn start_with(&mut self, config: CycleConfig) -> Result<Option<CycleEvent>> {
        config.validate()?;
        if self.is_running() {
            return Ok(None);
        }
        self.config = config;
        self.phase = BreathPhase::Inhale;
        self.elapsed_ms = 0;
        self.remaining_ms = config.total_duration_ms;
        self.next_flip_ms = Some(config.phase_duration_ms);
        self.next_tick_ms = Some(config.tick_interval_ms.min(config.total_duration_ms));
        debug!(
            phase_ms = config.phase_duration_ms,
            total_ms = config.total_duration_ms,
            "breathing session started"
        );
        Ok(Some(CycleEvent::PhaseChanged {
            phase: BreathPhase::Inhale,
            elapsed_ms: 0,
        }))
    }

    /// Stop the running session. A no-op returning `None` when idle.
    pub fn stop(&mut self) -> Option<CycleEvent> {
        if !self.is_running() {
            return None;
        }
        let elapsed_ms = self.elapsed_ms;
        self.clear();
        debug!(elapsed_ms, "breathing session stopped");
        Some(CycleEvent::Stopped { elapsed_ms })
    }

    /// Return to idle without emitting anything.
    pub fn reset(&mut self) {
        self.clear();
    }

    /// Move the timeline forward by `delta_ms` and return every event that
    /// became due, in order.
    ///
    /// When a tick and a phase flip share a timestamp the tick goes first,
    /// so a countdown reaching zero cancels a flip due at the same moment.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<CycleEvent> {
        let mut events = Vec::new();
        if !self.is_running() {
            return events;
        }
        let target = self.elapsed_ms.saturating_add(delta_ms);

        loop {
            let tick_due = self.next_tick_ms.filter(|&at| at <= target);
            let flip_due = self.next_flip_ms.filter(|&at| at <= target);

            match (tick_due, flip_due) {
                (Some(tick_at), Some(flip_at)) if tick_at <= flip_at => {
                    if let Some(done) = self.fire_tick(tick_at, &mut events) {
                        events.push(done);
                        return events;
                    }
                }
                (Some(tick_at), None) => {
                    if let Some(done) = self.fire_tick(tick_at, &mut events) {
                        events.push(done);
                        return events;
                    }
                }
                (_, Some(flip_at)) => self.fire_flip(flip_at, &mut events),
                (None, None) => break,
            }
        }

        self.elapsed_ms = target;
        events
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Returns the completion event when the countdown ran out.
    fn fire_tick(&mut self, at: u64, events: &mut Vec<CycleEvent>) -> Option<CycleEvent> {
        let total = self.config.total_duration_ms;
        self.elapsed_ms = at;
        self.remaining_ms = total.saturating_sub(at);
        events.push(CycleEvent::Tick {
            remaining_ms: self.remaining_ms,
            elapsed_ms: at,
        });

        if self.remaining_ms == 0 {
            self.clear();
            info!(elapsed_ms = total, "breathing session completed");
            return Some(CycleEvent::Completed { elapsed_ms: total });
        }

        self.next_tick_ms = Some(at.saturating_add(self.config.tick_interval_ms).min(total));
        None
    }

    fn fire_flip(&mut self, at: u64, events: &mut Vec<CycleEvent>) {
        self.elapsed_ms = at;
        self.phase = self.phase.flipped();
        self.next_flip_ms = Some(at.saturating_add(self.config.phase_duration_ms));
        debug!(phase = ?self.phase, elapsed_ms = at, "phase changed");
        events.push(CycleEvent::PhaseChanged {
            phase: self.phase,
            elapsed_ms: at,
        });
    }

    fn clear(&mut self) {
        self.phase = BreathPhase::Idle;
        self.elapsed_ms = 0;
        self.remaining_ms = self.config.total_duration_ms;
        self.next_flip_ms = None;
        self.next_tick_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};
    use proptest::prelude::*;

    fn phases(events: &[CycleEvent]) -> Vec<BreathPhase> {
        events
            .iter()
            .filter_map(|e| match e {
                CycleEvent::PhaseChanged { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    /// Start and feed time in `step_ms` slices until the session ends.
    fn run_to_end(config: CycleConfig, step_ms: u64) -> Vec<CycleEvent> {
        let mut controller = BreathingCycleController::new();
        let mut events: Vec<CycleEvent> = controller.start_with(config).unwrap().into_iter().collect();
        while controller.is_running() {
            events.extend(controller.advance(step_ms));
        }
        events
    }

    #[test]
    fn starts_idle() {
        let controller = BreathingCycleController::new();
        assert_eq!(controller.phase(), BreathPhase::Idle);
        assert_eq!(controller.remaining_ms(), 300_000);
        assert!(!controller.is_running());
    }

    #[test]
    fn start_enters_inhale() {
        let mut controller = BreathingCycleController::new();
        let event = controller.start().unwrap();
        assert_eq!(
            event,
            Some(CycleEvent::PhaseChanged {
                phase: BreathPhase::Inhale,
                elapsed_ms: 0
            })
        );
        assert_eq!(controller.phase(), BreathPhase::Inhale);
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut controller = BreathingCycleController::new();
        controller.start().unwrap();
        controller.advance(7_000);
        assert_eq!(controller.start().unwrap(), None);
        assert_eq!(controller.phase(), BreathPhase::Exhale);
        assert_eq!(controller.elapsed_ms(), 7_000);
    }

    #[test]
    fn invalid_config_leaves_state_untouched() {
        let mut controller = BreathingCycleController::new();
        let err = controller.start_with(CycleConfig::new(0, 10_000)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ZeroDuration { .. })
        ));
        assert_eq!(controller.phase(), BreathPhase::Idle);
        assert_eq!(controller.config(), &CycleConfig::default());
    }

    #[test]
    fn phases_alternate_every_phase_duration() {
        let mut controller = BreathingCycleController::new();
        controller.start().unwrap();

        let events = controller.advance(4_999);
        assert!(phases(&events).is_empty());
        assert_eq!(controller.remaining_ms(), 296_000);

        let events = controller.advance(1);
        assert_eq!(phases(&events), vec![BreathPhase::Exhale]);

        let events = controller.advance(5_000);
        assert_eq!(phases(&events), vec![BreathPhase::Inhale]);
    }

    #[test]
    fn tick_counts_down_each_second() {
        let mut controller = BreathingCycleController::new();
        controller.start().unwrap();
        let events = controller.advance(3_000);
        let ticks: Vec<u64> = events
            .iter()
            .filter_map(|e| match e {
                CycleEvent::Tick { remaining_ms, .. } => Some(*remaining_ms),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![299_000, 298_000, 297_000]);
    }

    #[test]
    fn full_default_session() {
        let events = run_to_end(CycleConfig::default(), 1_000);
        let phases = phases(&events);
        assert_eq!(phases.len(), 60);
        assert_eq!(phases[0], BreathPhase::Inhale);
        assert_eq!(phases[59], BreathPhase::Exhale);
        assert_eq!(events.last(), Some(&CycleEvent::Completed { elapsed_ms: 300_000 }));
    }

    #[test]
    fn completion_cancels_coinciding_flip() {
        let mut controller = BreathingCycleController::with_config(CycleConfig::new(5_000, 10_000)).unwrap();
        controller.start().unwrap();
        let events = controller.advance(60_000);

        assert_eq!(
            phases(&events),
            vec![BreathPhase::Exhale],
            "the flip due at 10s must not fire"
        );
        assert_eq!(
            &events[events.len() - 2..],
            &[
                CycleEvent::Tick {
                    remaining_ms: 0,
                    elapsed_ms: 10_000
                },
                CycleEvent::Completed { elapsed_ms: 10_000 },
            ]
        );
        assert_eq!(controller.phase(), BreathPhase::Idle);
        assert_eq!(controller.remaining_ms(), 10_000);
    }

    #[test]
    fn total_not_multiple_of_tick_still_completes() {
        let config = CycleConfig::new(500, 2_500);
        let events = run_to_end(config, 700);
        assert_eq!(events.last(), Some(&CycleEvent::Completed { elapsed_ms: 2_500 }));
        let last_tick = events.iter().rev().find_map(|e| match e {
            CycleEvent::Tick { elapsed_ms, .. } => Some(*elapsed_ms),
            _ => None,
        });
        assert_eq!(last_tick, Some(2_500));
    }

    #[test]
    fn stop_reports_elapsed_and_silences_timers() {
        let mut controller = BreathingCycleController::new();
        controller.start().unwrap();
        controller.advance(12_345);

        assert_eq!(controller.stop(), Some(CycleEvent::Stopped { elapsed_ms: 12_345 }));
        assert_eq!(controller.phase(), BreathPhase::Idle);
        assert_eq!(controller.remaining_ms(), 300_000);
        assert!(controller.advance(100_000).is_empty());
    }

    #[test]
    fn second_stop_is_silent() {
        let mut controller = BreathingCycleController::new();
        controller.start().unwrap();
        controller.advance(1_000);
        assert!(controller.stop().is_some());
        assert_eq!(controller.stop(), None);
    }

    #[test]
    fn reset_is_silent() {
        let mut controller = BreathingCycleController::new();
        controller.start().unwrap();
        controller.advance(6_000);
        controller.reset();
        assert_eq!(controller.state().phase, BreathPhase::Idle);
        assert_eq!(controller.stop(), None);
    }

    proptest! {
        #[test]
        fn phase_count_matches_total_over_phase(
            phase_ms in 100u64..4_000,
            cycles in 1u64..12,
            step_ms in 50u64..5_000,
        ) {
            let total = phase_ms * 2 * cycles;
            let events = run_to_end(CycleConfig::new(phase_ms, total), step_ms);
            let phases = phases(&events);

            prop_assert_eq!(phases.len() as u64, total / phase_ms);
            for (i, phase) in phases.iter().enumerate() {
                let expected = if i % 2 == 0 { BreathPhase::Inhale } else { BreathPhase::Exhale };
                prop_assert_eq!(*phase, expected);
            }
            let terminal: Vec<CycleEvent> = events.iter().filter(|e| e.is_terminal()).copied().collect();
            prop_assert_eq!(terminal, vec![CycleEvent::Completed { elapsed_ms: total }]);
        }

        #[test]
        fn stop_before_end_emits_single_stopped(
            stop_at in 0u64..299_999,
        ) {
            let mut controller = BreathingCycleController::new();
            controller.start().unwrap();
            controller.advance(stop_at);
            prop_assert_eq!(controller.stop(), Some(CycleEvent::Stopped { elapsed_ms: stop_at }));
            prop_assert!(controller.advance(300_000).is_empty());
            prop_assert_eq!(controller.stop(), None);
        }
    }
}
