//! Session records.
//!
//! A [`SessionRecord`] is built once, when a practice session ends, from the
//! elapsed duration and the number of inhales observed. It is never mutated
//! after it is appended to the log.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Minimum elapsed time for a session to count as completed (~93% of 5 min).
pub const DEFAULT_COMPLETION_THRESHOLD_MS: u64 = 280_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// The stock 5s/5s rhythm over 5 minutes.
    #[default]
    Standard,
    /// Any other phase or total duration.
    Custom,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Standard => "standard",
            SessionKind::Custom => "custom",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(SessionKind::Standard),
            "custom" => Ok(SessionKind::Custom),
            other => Err(format!("unknown session kind: {other}")),
        }
    }
}

/// Derived breathing metrics for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Whole cycles that fit in the elapsed duration.
    pub expected_breath_count: u64,
    /// `breath_count / expected * 100`, rounded. Not clamped: over-breathing
    /// yields values above 100.
    pub accuracy_pct: u32,
    /// Respirations per minute, rounded.
    pub average_rpm: u32,
}

impl SessionMetrics {
    pub fn compute(duration_ms: u64, breath_count: u32, cycle_period_ms: u64) -> Self {
        let expected_breath_count = if cycle_period_ms == 0 {
            0
        } else {
            duration_ms / cycle_period_ms
        };
        let accuracy_pct = if expected_breath_count == 0 {
            0
        } else {
            (breath_count as f64 / expected_breath_count as f64 * 100.0).round() as u32
        };
        let average_rpm = if duration_ms == 0 {
            0
        } else {
            (breath_count as f64 * 60_000.0 / duration_ms as f64).round() as u32
        };
        Self {
            expected_breath_count,
            accuracy_pct,
            average_rpm,
        }
    }
}

/// One completed or aborted practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    /// Stored as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub completed: bool,
    pub breath_count: u32,
    pub accuracy_pct: u32,
    pub average_rpm: u32,
    #[serde(default)]
    pub kind: SessionKind,
}

impl SessionRecord {
    /// Build a record from raw measurements taken at the end of a session.
    pub fn from_measurements(
        started_at: DateTime<Utc>,
        duration_ms: u64,
        breath_count: u32,
        cycle_period_ms: u64,
        completion_threshold_ms: u64,
    ) -> Self {
        let metrics = SessionMetrics::compute(duration_ms, breath_count, cycle_period_ms);
        Self {
            id: Self::new_id(started_at),
            started_at,
            duration_ms,
            completed: duration_ms >= completion_threshold_ms,
            breath_count,
            accuracy_pct: metrics.accuracy_pct,
            average_rpm: metrics.average_rpm,
            kind: SessionKind::Standard,
        }
    }

    pub fn with_kind(mut self, kind: SessionKind) -> Self {
        self.kind = kind;
        self
    }

    /// `session_<epoch ms>_<random suffix>`.
    pub fn new_id(started_at: DateTime<Utc>) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        format!("session_{}_{}", started_at.timestamp_millis(), &suffix[..9])
    }

    /// Calendar day the session started on, in local time.
    pub fn local_day(&self) -> NaiveDate {
        self.started_at.with_timezone(&Local).date_naive()
    }

    pub fn duration_sec(&self) -> f64 {
        self.duration_ms as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap()
    }

    #[test]
    fn full_session_metrics() {
        let record = SessionRecord::from_measurements(t0(), 300_000, 30, 10_000, 280_000);
        assert_eq!(record.accuracy_pct, 100);
        assert_eq!(record.average_rpm, 6);
        assert!(record.completed);
        assert_eq!(
            SessionMetrics::compute(300_000, 30, 10_000).expected_breath_count,
            30
        );
    }

    #[test]
    fn short_session_metrics() {
        let metrics = SessionMetrics::compute(120_000, 10, 10_000);
        assert_eq!(metrics.expected_breath_count, 12);
        assert_eq!(metrics.accuracy_pct, 83);
        assert_eq!(metrics.average_rpm, 5);

        let record = SessionRecord::from_measurements(t0(), 120_000, 10, 10_000, 280_000);
        assert!(!record.completed);
    }

    #[test]
    fn threshold_is_inclusive() {
        let at = SessionRecord::from_measurements(t0(), 280_000, 28, 10_000, 280_000);
        let below = SessionRecord::from_measurements(t0(), 279_999, 28, 10_000, 280_000);
        assert!(at.completed);
        assert!(!below.completed);
    }

    #[test]
    fn zero_duration_has_zero_rates() {
        let metrics = SessionMetrics::compute(0, 0, 10_000);
        assert_eq!(metrics.expected_breath_count, 0);
        assert_eq!(metrics.accuracy_pct, 0);
        assert_eq!(metrics.average_rpm, 0);
    }

    #[test]
    fn over_breathing_is_not_clamped() {
        let metrics = SessionMetrics::compute(60_000, 9, 10_000);
        assert_eq!(metrics.accuracy_pct, 150);
    }

    #[test]
    fn id_embeds_start_millis() {
        let id = SessionRecord::new_id(t0());
        let prefix = format!("session_{}_", t0().timestamp_millis());
        assert!(id.starts_with(&prefix));
        assert_eq!(id.len(), prefix.len() + 9);
        assert_ne!(id, SessionRecord::new_id(t0()));
    }

    #[test]
    fn json_uses_epoch_millis() {
        let record = SessionRecord::from_measurements(t0(), 300_000, 30, 10_000, 280_000);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["started_at"], t0().timestamp_millis());
        assert_eq!(json["kind"], "standard");

        let back: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn missing_kind_defaults_to_standard() {
        let json = serde_json::json!({
            "id": "session_1",
            "started_at": 1_700_000_000_000i64,
            "duration_ms": 1000,
            "completed": false,
            "breath_count": 0,
            "accuracy_pct": 0,
            "average_rpm": 0
        });
        let record: SessionRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.kind, SessionKind::Standard);
    }
}
