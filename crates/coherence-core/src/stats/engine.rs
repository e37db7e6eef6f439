//! Session log ownership and aggregate statistics.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::analytics::{self, SessionAnalysis};
use super::period::Period;
use super::streak::{best_streak, completed_days, current_streak};
use crate::error::{CoreError, Result, ValidationError};
use crate::session::SessionRecord;
use crate::storage::SessionStore;

/// Records kept before the oldest are pruned.
pub const DEFAULT_MAX_STORED_SESSIONS: usize = 100;

/// Version tag written into export bundles.
pub const EXPORT_VERSION: &str = "1.0";

/// Append-only, insertion-ordered, capped list of sessions.
#[derive(Debug, Clone)]
pub struct SessionLog {
    records: Vec<SessionRecord>,
    capacity: usize,
}

impl SessionLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Vec::new(),
            capacity,
        }
    }

    pub fn records(&self) -> &[SessionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The record appended last, by position in the log.
    pub fn last_appended(&self) -> Option<&SessionRecord> {
        self.records.last()
    }

    /// Append and prune. Returns the records that were dropped.
    pub fn append(&mut self, record: SessionRecord) -> Vec<SessionRecord> {
        self.records.push(record);
        self.prune()
    }

    /// Swap in a whole new set of records, then prune.
    pub fn replace(&mut self, records: Vec<SessionRecord>) -> Vec<SessionRecord> {
        self.records = records;
        self.prune()
    }

    /// Keep only records matching `keep`. Returns how many were removed.
    pub fn retain(&mut self, keep: impl FnMut(&SessionRecord) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(keep);
        before - self.records.len()
    }

    /// Drop the oldest records by `started_at` until within capacity.
    /// Survivors keep their insertion order.
    fn prune(&mut self) -> Vec<SessionRecord> {
        let mut dropped = Vec::new();
        while self.records.len() > self.capacity {
            let oldest = self
                .records
                .iter()
                .enumerate()
                .min_by_key(|(_, r)| r.started_at)
                .map(|(i, _)| i);
            match oldest {
                Some(i) => dropped.push(self.records.remove(i)),
                None => break,
            }
        }
        dropped
    }
}

/// Aggregates over one period. Rates and averages are zero for an empty
/// period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    /// Percent, rounded.
    pub completion_rate: u32,
    pub total_duration_sec: u64,
    pub average_duration_sec: u64,
    pub average_accuracy_pct: u32,
    /// Current streak over the whole log, whatever the period.
    pub streak: u32,
    /// Best streak over the whole log, whatever the period.
    pub best_streak: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodaySummary {
    pub sessions: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub sessions: u64,
    pub completed: u64,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickSummary {
    pub today: TodaySummary,
    pub week: WeekSummary,
    /// Last record by log position. Not necessarily the latest `started_at`.
    pub last_session: Option<SessionRecord>,
}

/// Portable dump of the whole log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub sessions: Vec<SessionRecord>,
    pub export_date: DateTime<Utc>,
    pub version: String,
}

/// Owns the session log and its persistence collaborator.
///
/// Every mutation is written through to the store. Read methods are pure
/// functions of the in-memory log; each has an `_at` variant taking an
/// explicit "now".
pub struct SessionStatsEngine<S: SessionStore> {
    store: S,
    log: SessionLog,
}

impl<S: SessionStore> SessionStatsEngine<S> {
    /// Load the log from `store` with the default cap.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn open(store: S) -> Result<Self> {
        Self::with_capacity(store, DEFAULT_MAX_STORED_SESSIONS)
    }

    /// Load the log from `store`, keeping at most `capacity` records.
    pub fn with_capacity(store: S, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ValidationError::InvalidValue {
                field: "max_stored_sessions".into(),
                message: "must keep at least one session".into(),
            }
            .into());
        }
        let mut log = SessionLog::new(capacity);
        let dropped = log.replace(store.load()?);
        if !dropped.is_empty() {
            warn!(dropped = dropped.len(), "stored sessions exceed cap, pruned on load");
        }
        Ok(Self { store, log })
    }

    pub fn log(&self) -> &SessionLog {
        &self.log
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Append a finished session and persist the log.
    ///
    /// # Errors
    /// [`CoreError::PersistenceUnavailable`] when the save fails. The record
    /// stays in the in-memory log either way.
    /// [`CoreError::Validation`] when the log already holds a session with
    /// the same id; nothing changes.
    pub fn record_session(&mut self, record: SessionRecord) -> Result<()> {
        if self.log.records().iter().any(|r| r.id == record.id) {
            return Err(duplicate_id(&record.id));
        }
        info!(
            id = %record.id,
            duration_ms = record.duration_ms,
            completed = record.completed,
            "session recorded"
        );
        let dropped = self.log.append(record);
        if !dropped.is_empty() {
            info!(dropped = dropped.len(), "pruned oldest sessions");
        }
        self.persist()
    }

    /// Replace the log with an exported bundle. Returns the number of
    /// sessions kept after pruning.
    ///
    /// A bundle with an unknown version or repeated session ids is rejected
    /// before the log changes.
    pub fn import(&mut self, bundle: ExportBundle) -> Result<usize> {
        if bundle.version != EXPORT_VERSION {
            return Err(ValidationError::InvalidValue {
                field: "version".into(),
                message: format!("unsupported export version '{}'", bundle.version),
            }
            .into());
        }
        let mut seen = HashSet::new();
        if let Some(dup) = bundle.sessions.iter().find(|r| !seen.insert(r.id.as_str())) {
            return Err(duplicate_id(&dup.id));
        }
        self.log.replace(bundle.sessions);
        self.persist()?;
        Ok(self.log.len())
    }

    /// Drop sessions older than `days_to_keep` days. Returns how many went.
    pub fn cleanup(&mut self, days_to_keep: u32) -> Result<usize> {
        self.cleanup_at(days_to_keep, Local::now())
    }

    pub fn cleanup_at(&mut self, days_to_keep: u32, now: DateTime<Local>) -> Result<usize> {
        let cutoff = (now - Duration::days(i64::from(days_to_keep))).with_timezone(&Utc);
        let removed = self.log.retain(|r| r.started_at >= cutoff);
        if removed > 0 {
            info!(removed, days_to_keep, "cleaned up old sessions");
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(self.log.records()).map_err(|source| {
            warn!(error = %source, "failed to persist session log");
            CoreError::PersistenceUnavailable { source }
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Sessions within `period`, most recent first.
    pub fn sessions(&self, period: Period) -> Vec<&SessionRecord> {
        self.sessions_at(period, Local::now())
    }

    pub fn sessions_at(&self, period: Period, now: DateTime<Local>) -> Vec<&SessionRecord> {
        let mut sessions: Vec<&SessionRecord> = self
            .log
            .records()
            .iter()
            .filter(|r| period.contains(r, now))
            .collect();
        sessions.sort_by_key(|r| Reverse(r.started_at));
        sessions
    }

    pub fn statistics(&self, period: Period) -> Statistics {
        self.statistics_at(period, Local::now())
    }

    pub fn statistics_at(&self, period: Period, now: DateTime<Local>) -> Statistics {
        let sessions = self.sessions_at(period, now);
        let total = sessions.len() as u64;
        let completed = sessions.iter().filter(|r| r.completed).count() as u64;
        let total_duration_ms = sessions
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.duration_ms));
        let total_accuracy = sessions
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(u64::from(r.accuracy_pct)));

        let days = completed_days(self.log.records());
        Statistics {
            total_sessions: total,
            completed_sessions: completed,
            completion_rate: ratio_pct(completed, total),
            total_duration_sec: rounded_div(total_duration_ms, 1000),
            average_duration_sec: if total == 0 {
                0
            } else {
                rounded_div(total_duration_ms, total.saturating_mul(1000))
            },
            average_accuracy_pct: rounded_div(total_accuracy, total) as u32,
            streak: current_streak(&days, now.date_naive()),
            best_streak: best_streak(&days),
        }
    }

    pub fn quick_summary(&self) -> QuickSummary {
        self.quick_summary_at(Local::now())
    }

    pub fn quick_summary_at(&self, now: DateTime<Local>) -> QuickSummary {
        let today = self.statistics_at(Period::Today, now);
        let week = self.statistics_at(Period::Week, now);
        QuickSummary {
            today: TodaySummary {
                sessions: today.total_sessions,
                completed: today.completed_sessions,
            },
            week: WeekSummary {
                sessions: week.total_sessions,
                completed: week.completed_sessions,
                streak: week.streak,
            },
            last_session: self.log.last_appended().cloned(),
        }
    }

    pub fn analyze(&self, period: Period) -> SessionAnalysis {
        self.analyze_at(period, Local::now())
    }

    pub fn analyze_at(&self, period: Period, now: DateTime<Local>) -> SessionAnalysis {
        analytics::analyze(&self.sessions_at(period, now), now)
    }

    pub fn export(&self) -> ExportBundle {
        ExportBundle {
            sessions: self.log.records().to_vec(),
            export_date: Utc::now(),
            version: EXPORT_VERSION.to_string(),
        }
    }
}

fn duplicate_id(id: &str) -> CoreError {
    ValidationError::InvalidValue {
        field: "id".into(),
        message: format!("duplicate session id '{id}'"),
    }
    .into()
}

/// `round(part / whole * 100)`, zero when `whole` is zero.
fn ratio_pct(part: u64, whole: u64) -> u32 {
    rounded_div(part.saturating_mul(100), whole).min(u64::from(u32::MAX)) as u32
}

/// Integer division rounding half up, zero for a zero divisor. Never
/// overflows.
fn rounded_div(numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let remainder = numerator % denominator;
    numerator / denominator + u64::from(remainder >= denominator - denominator / 2)
}
