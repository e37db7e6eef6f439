//! Cycle timing configuration.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_PHASE_DURATION_MS: u64 = 5_000;
pub const DEFAULT_TOTAL_DURATION_MS: u64 = 300_000;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1_000;

/// Timing of one session: equal inhale/exhale phases repeated until
/// `total_duration_ms` runs out, with a countdown tick every
/// `tick_interval_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_phase_duration")]
    pub phase_duration_ms: u64,
    #[serde(default = "default_total_duration")]
    pub total_duration_ms: u64,
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_phase_duration() -> u64 {
    DEFAULT_PHASE_DURATION_MS
}
fn default_total_duration() -> u64 {
    DEFAULT_TOTAL_DURATION_MS
}
fn default_tick_interval() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            phase_duration_ms: DEFAULT_PHASE_DURATION_MS,
            total_duration_ms: DEFAULT_TOTAL_DURATION_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl CycleConfig {
    pub fn new(phase_duration_ms: u64, total_duration_ms: u64) -> Self {
        Self {
            phase_duration_ms,
            total_duration_ms,
            ..Self::default()
        }
    }

    /// Reject timings that would never tick or never end.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.phase_duration_ms == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "phase_duration_ms",
            });
        }
        if self.total_duration_ms == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "total_duration_ms",
            });
        }
        if self.tick_interval_ms == 0 {
            return Err(ValidationError::ZeroDuration {
                field: "tick_interval_ms",
            });
        }
        Ok(())
    }

    /// One inhale plus one exhale.
    pub fn cycle_period_ms(&self) -> u64 {
        self.phase_duration_ms.saturating_mul(2)
    }

    /// Whether the breathing rhythm is the stock 5s/5s over 5 minutes.
    pub fn is_standard(&self) -> bool {
        self.phase_duration_ms == DEFAULT_PHASE_DURATION_MS
            && self.total_duration_ms == DEFAULT_TOTAL_DURATION_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_cardiac_coherence() {
        let cfg = CycleConfig::default();
        assert_eq!(cfg.phase_duration_ms, 5000);
        assert_eq!(cfg.total_duration_ms, 300_000);
        assert_eq!(cfg.cycle_period_ms(), 10_000);
        assert!(cfg.is_standard());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_durations_are_rejected() {
        assert_eq!(
            CycleConfig::new(0, 1000).validate(),
            Err(ValidationError::ZeroDuration {
                field: "phase_duration_ms"
            })
        );
        assert_eq!(
            CycleConfig::new(1000, 0).validate(),
            Err(ValidationError::ZeroDuration {
                field: "total_duration_ms"
            })
        );
        let cfg = CycleConfig {
            tick_interval_ms: 0,
            ..CycleConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let cfg: CycleConfig = toml::from_str("phase_duration_ms = 4000").unwrap();
        assert_eq!(cfg.phase_duration_ms, 4000);
        assert_eq!(cfg.total_duration_ms, DEFAULT_TOTAL_DURATION_MS);
        assert!(!cfg.is_standard());
    }
}
