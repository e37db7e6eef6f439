//! Statistics module for Coherence
//!
//! This module owns the session log and derives read-only views over it:
//! period filters, streaks, aggregate statistics, and longer-term analytics
//! (consistency, trends, weekday and time-of-day patterns, insights).

mod analytics;
mod engine;
mod period;
mod streak;

pub use analytics::{
    AccuracyTrend, HourSummary, Insight, InsightKind, InsightPriority, SessionAnalysis, TrendPoint,
    ValueTrend, WeekdayPattern,
};
pub use engine::{
    ExportBundle, QuickSummary, SessionLog, SessionStatsEngine, Statistics, TodaySummary,
    WeekSummary, DEFAULT_MAX_STORED_SESSIONS, EXPORT_VERSION,
};
pub use period::Period;
pub use streak::{best_streak, completed_days, current_streak, practice_runs, StreakRun};
