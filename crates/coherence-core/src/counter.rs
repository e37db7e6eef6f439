//! Breath counting on the orchestrator side of the cycle controller.
//!
//! The counter listens to [`CycleEvent`]s, counts one breath per inhale, and
//! turns the tally into a [`SessionRecord`] when the session ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cycle::{BreathPhase, CycleConfig};
use crate::events::CycleEvent;
use crate::session::{SessionKind, SessionMetrics, SessionRecord};

/// Counter tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Respirations per minute the user aims for (cardiac coherence: 6).
    #[serde(default = "default_target_rpm")]
    pub target_rpm: u32,
    /// Minimum breaths/expected ratio for a session to be valid.
    #[serde(default = "default_validation_threshold")]
    pub validation_threshold: f64,
}

fn default_target_rpm() -> u32 {
    6
}
fn default_validation_threshold() -> f64 {
    0.8
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            target_rpm: default_target_rpm(),
            validation_threshold: default_validation_threshold(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhythmFeedback {
    /// Breathing faster than the target, slow down.
    Slower,
    /// Breathing slower than the target, speed up.
    Faster,
    OnTarget,
}

#[derive(Debug, Clone, Default)]
pub struct BreathCounter {
    config: CounterConfig,
    count: u32,
    started_at: Option<DateTime<Utc>>,
}

impl BreathCounter {
    pub fn new(config: CounterConfig) -> Self {
        Self {
            config,
            count: 0,
            started_at: None,
        }
    }

    /// Reset the tally for a session that started at `started_at`.
    pub fn begin(&mut self, started_at: DateTime<Utc>) {
        self.count = 0;
        self.started_at = Some(started_at);
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Feed one controller event. Returns true when it counted a breath.
    pub fn observe(&mut self, event: &CycleEvent) -> bool {
        match event {
            CycleEvent::PhaseChanged {
                phase: BreathPhase::Inhale,
                ..
            } if self.is_active() => {
                self.count += 1;
                true
            }
            _ => false,
        }
    }

    /// Breaths per minute so far, rounded. Zero before the first breath.
    pub fn current_rpm(&self, now: DateTime<Utc>) -> u32 {
        match self.rpm_since_start(now) {
            Some(rpm) if self.count > 0 => rpm.round() as u32,
            _ => 0,
        }
    }

    /// Compare the running rate with the target, allowing one rpm either way.
    pub fn rhythm_feedback(&self, now: DateTime<Utc>) -> Option<RhythmFeedback> {
        let rpm = self.rpm_since_start(now)?;
        let target = self.config.target_rpm as f64;
        let feedback = if (rpm - target).abs() <= 1.0 {
            RhythmFeedback::OnTarget
        } else if rpm > target {
            RhythmFeedback::Slower
        } else {
            RhythmFeedback::Faster
        };
        Some(feedback)
    }

    /// Whether the tally reaches the validation threshold for `duration_ms`.
    pub fn is_valid(&self, duration_ms: u64, cycle_period_ms: u64) -> bool {
        let expected = SessionMetrics::compute(duration_ms, self.count, cycle_period_ms).expected_breath_count;
        expected > 0 && self.count as f64 / expected as f64 >= self.config.validation_threshold
    }

    /// Close the session and build its record. `None` if `begin` was never
    /// called.
    pub fn finish(
        &mut self,
        duration_ms: u64,
        cycle: &CycleConfig,
        completion_threshold_ms: u64,
    ) -> Option<SessionRecord> {
        let started_at = self.started_at.take()?;
        let kind = if cycle.is_standard() {
            SessionKind::Standard
        } else {
            SessionKind::Custom
        };
        Some(
            SessionRecord::from_measurements(
                started_at,
                duration_ms,
                self.count,
                cycle.cycle_period_ms(),
                completion_threshold_ms,
            )
            .with_kind(kind),
        )
    }

    fn rpm_since_start(&self, now: DateTime<Utc>) -> Option<f64> {
        let started_at = self.started_at?;
        let elapsed_ms = (now - started_at).num_milliseconds();
        if elapsed_ms <= 0 {
            return None;
        }
        Some(self.count as f64 * 60_000.0 / elapsed_ms as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::BreathingCycleController;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap()
    }

    fn inhale() -> CycleEvent {
        CycleEvent::PhaseChanged {
            phase: BreathPhase::Inhale,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn counts_only_inhales_while_active() {
        let mut counter = BreathCounter::default();
        assert!(!counter.observe(&inhale()));

        counter.begin(t0());
        assert!(counter.observe(&inhale()));
        assert!(!counter.observe(&CycleEvent::PhaseChanged {
            phase: BreathPhase::Exhale,
            elapsed_ms: 5000
        }));
        assert!(!counter.observe(&CycleEvent::Tick {
            remaining_ms: 1000,
            elapsed_ms: 1000
        }));
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn full_controlled_session_gives_perfect_record() {
        let mut controller = BreathingCycleController::new();
        let mut counter = BreathCounter::default();
        counter.begin(t0());

        let mut events: Vec<CycleEvent> = controller.start().unwrap().into_iter().collect();
        while controller.is_running() {
            events.extend(controller.advance(1_000));
        }
        for event in &events {
            counter.observe(event);
        }
        assert_eq!(counter.count(), 30);

        let record = counter.finish(300_000, controller.config(), 280_000).unwrap();
        assert_eq!(record.breath_count, 30);
        assert_eq!(record.accuracy_pct, 100);
        assert_eq!(record.average_rpm, 6);
        assert!(record.completed);
        assert_eq!(record.kind, SessionKind::Standard);
        assert!(!counter.is_active());
    }

    #[test]
    fn custom_rhythm_marks_record_custom() {
        let mut counter = BreathCounter::default();
        counter.begin(t0());
        let cycle = CycleConfig::new(4_000, 120_000);
        let record = counter.finish(120_000, &cycle, 280_000).unwrap();
        assert_eq!(record.kind, SessionKind::Custom);
    }

    #[test]
    fn finish_without_begin_is_none() {
        let mut counter = BreathCounter::default();
        assert!(counter.finish(1000, &CycleConfig::default(), 280_000).is_none());
    }

    #[test]
    fn rpm_and_feedback() {
        let mut counter = BreathCounter::default();
        counter.begin(t0());
        assert_eq!(counter.current_rpm(t0() + Duration::seconds(30)), 0);

        for _ in 0..6 {
            counter.observe(&inhale());
        }
        let one_min = t0() + Duration::minutes(1);
        assert_eq!(counter.current_rpm(one_min), 6);
        assert_eq!(counter.rhythm_feedback(one_min), Some(RhythmFeedback::OnTarget));

        for _ in 0..4 {
            counter.observe(&inhale());
        }
        assert_eq!(counter.rhythm_feedback(one_min), Some(RhythmFeedback::Slower));
        assert_eq!(
            counter.rhythm_feedback(t0() + Duration::minutes(5)),
            Some(RhythmFeedback::Faster)
        );
        assert_eq!(counter.rhythm_feedback(t0()), None);
    }

    #[test]
    fn validity_threshold() {
        let mut counter = BreathCounter::default();
        counter.begin(t0());
        for _ in 0..24 {
            counter.observe(&inhale());
        }
        assert!(counter.is_valid(300_000, 10_000));
        assert!(!counter.is_valid(310_000 * 2, 10_000));
        assert!(!counter.is_valid(5_000, 10_000));
    }
}
