//! Longer-term practice analytics.
//!
//! Consistency score, moving-average accuracy, frequency and duration
//! trends, weekday and time-of-day breakdowns, the best practice runs, and
//! the insights drawn from them. Everything here is a pure function of a
//! slice of records and "now".

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Local, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use super::streak::{practice_runs, StreakRun};
use crate::session::SessionRecord;

const MAX_TREND_WINDOW: usize = 7;
const MAX_BEST_STREAKS: usize = 5;
const VALUE_TREND_WINDOW: usize = 7;

const ENCOURAGEMENT_BELOW_SESSIONS: usize = 5;
const REMINDER_AFTER_DAYS: i64 = 7;
const IMPROVEMENT_ABOVE_PCT: f64 = 10.0;
const CONSISTENCY_ABOVE: f64 = 0.8;
const BEST_HOUR_ABOVE_PCT: f64 = 85.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub started_at: DateTime<Utc>,
    /// Mean accuracy over the window ending at this session.
    pub value: f64,
    pub window: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyTrend {
    pub points: Vec<TrendPoint>,
    /// Least-squares slope of `value` per session.
    pub slope: f64,
    /// Last point minus first point.
    pub improvement: f64,
}

/// Summary of one per-day or per-session series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueTrend {
    pub average: f64,
    pub max: f64,
    pub min: f64,
    /// 7-point moving average, empty with fewer than 7 values.
    pub moving_average: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Encouragement,
    Reminder,
    Achievement,
    Tip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub priority: InsightPriority,
    pub title: String,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, priority: InsightPriority, title: &str, message: String) -> Self {
        Self {
            kind,
            priority,
            title: title.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekdayPattern {
    pub weekday: Weekday,
    pub count: u64,
    pub average_duration_sec: f64,
    pub average_accuracy_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourSummary {
    /// Local hour of day, 0-23.
    pub hour: u32,
    pub count: u64,
    pub average_accuracy_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionAnalysis {
    pub total_sessions: u64,
    /// 0.0 - 1.0: share of days since the first session that saw practice.
    pub consistency_score: f64,
    pub accuracy_trend: AccuracyTrend,
    /// Sessions per practice day, in day order.
    pub frequency_trend: ValueTrend,
    /// Session length in seconds, in start order.
    pub duration_trend: ValueTrend,
    /// Monday through Sunday.
    pub weekday: Vec<WeekdayPattern>,
    /// Hour with the best mean accuracy.
    pub best_hour: Option<HourSummary>,
    pub best_streaks: Vec<StreakRun>,
    /// Most urgent first.
    pub insights: Vec<Insight>,
}

pub(crate) fn analyze(records: &[&SessionRecord], now: DateTime<Local>) -> SessionAnalysis {
    let mut chronological: Vec<&SessionRecord> = records.to_vec();
    chronological.sort_by_key(|r| r.started_at);

    let practice_days: BTreeSet<_> = records.iter().map(|r| r.local_day()).collect();
    let mut best_streaks = practice_runs(&practice_days);
    best_streaks.truncate(MAX_BEST_STREAKS);

    let consistency_score = consistency_score(&chronological, practice_days.len(), now);
    let accuracy_trend = accuracy_trend(&chronological);
    let best_hour = best_hour(records);
    let insights = insights(
        &chronological,
        now,
        &accuracy_trend,
        consistency_score,
        best_hour.as_ref(),
    );

    SessionAnalysis {
        total_sessions: records.len() as u64,
        consistency_score,
        frequency_trend: frequency_trend(&chronological),
        duration_trend: value_trend(chronological.iter().map(|r| r.duration_sec()).collect()),
        accuracy_trend,
        weekday: weekday_patterns(records),
        best_hour,
        best_streaks,
        insights,
    }
}

fn consistency_score(chronological: &[&SessionRecord], distinct_days: usize, now: DateTime<Local>) -> f64 {
    let Some(first) = chronological.first() else {
        return 0.0;
    };
    if chronological.len() < 2 {
        return 0.0;
    }
    let days_since_first = (now.with_timezone(&Utc) - first.started_at).num_milliseconds() as f64 / 86_400_000.0;
    (distinct_days as f64 / days_since_first.max(1.0)).min(1.0)
}

fn accuracy_trend(chronological: &[&SessionRecord]) -> AccuracyTrend {
    if chronological.is_empty() {
        return AccuracyTrend::default();
    }
    let window = chronological.len().div_ceil(10).clamp(1, MAX_TREND_WINDOW);

    let points: Vec<TrendPoint> = chronological
        .windows(window)
        .map(|w| TrendPoint {
            started_at: w[w.len() - 1].started_at,
            value: w.iter().map(|r| r.accuracy_pct as f64).sum::<f64>() / w.len() as f64,
            window: w.len(),
        })
        .collect();

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let improvement = match (values.first(), values.last()) {
        (Some(first), Some(last)) if values.len() > 1 => last - first,
        _ => 0.0,
    };
    AccuracyTrend {
        slope: slope(&values),
        improvement,
        points,
    }
}

fn frequency_trend(chronological: &[&SessionRecord]) -> ValueTrend {
    let mut per_day: BTreeMap<_, u64> = BTreeMap::new();
    for r in chronological {
        *per_day.entry(r.local_day()).or_default() += 1;
    }
    value_trend(per_day.into_values().map(|count| count as f64).collect())
}

fn value_trend(values: Vec<f64>) -> ValueTrend {
    if values.is_empty() {
        return ValueTrend::default();
    }
    ValueTrend {
        average: values.iter().sum::<f64>() / values.len() as f64,
        max: values.iter().copied().fold(f64::MIN, f64::max),
        min: values.iter().copied().fold(f64::MAX, f64::min),
        moving_average: moving_average(&values, VALUE_TREND_WINDOW),
    }
}

/// Mean of every full `window`-sized run of `values`.
fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    values
        .windows(window)
        .map(|w| w.iter().sum::<f64>() / w.len() as f64)
        .collect()
}

fn insights(
    chronological: &[&SessionRecord],
    now: DateTime<Local>,
    accuracy: &AccuracyTrend,
    consistency: f64,
    best_hour: Option<&HourSummary>,
) -> Vec<Insight> {
    let mut insights = Vec::new();
    let Some(latest) = chronological.last() else {
        return insights;
    };

    if chronological.len() < ENCOURAGEMENT_BELOW_SESSIONS {
        insights.push(Insight::new(
            InsightKind::Encouragement,
            InsightPriority::High,
            "Keep it up",
            "You have taken your first steps. Regular practice is what makes the difference.".into(),
        ));
    }

    let quiet_since = now.with_timezone(&Utc) - chrono::Duration::days(REMINDER_AFTER_DAYS);
    if latest.started_at < quiet_since {
        insights.push(Insight::new(
            InsightKind::Reminder,
            InsightPriority::High,
            "Time to get back to it",
            format!("No practice in the last {REMINDER_AFTER_DAYS} days. A short session still counts."),
        ));
    }

    if accuracy.improvement > IMPROVEMENT_ABOVE_PCT {
        insights.push(Insight::new(
            InsightKind::Achievement,
            InsightPriority::Medium,
            "Accuracy is improving",
            format!("Your accuracy went up by {}% recently.", accuracy.improvement.round()),
        ));
    }

    if consistency > CONSISTENCY_ABOVE {
        insights.push(Insight::new(
            InsightKind::Achievement,
            InsightPriority::Medium,
            "Remarkable consistency",
            "You practice almost every day. Keep going.".into(),
        ));
    }

    if let Some(best) = best_hour.filter(|h| h.average_accuracy_pct > BEST_HOUR_ABOVE_PCT) {
        insights.push(Insight::new(
            InsightKind::Tip,
            InsightPriority::Low,
            "Your best time of day",
            format!(
                "You breathe most accurately around {}h ({}% on average).",
                best.hour,
                best.average_accuracy_pct.round()
            ),
        ));
    }

    insights
}

/// Least-squares slope of `values` against their index.
fn slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if values.len() < 2 {
        return 0.0;
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn weekday_patterns(records: &[&SessionRecord]) -> Vec<WeekdayPattern> {
    let mut totals = [(0u64, 0u64, 0u64); 7];
    for r in records {
        let slot = &mut totals[r.started_at.with_timezone(&Local).weekday().num_days_from_monday() as usize];
        slot.0 += 1;
        slot.1 = slot.1.saturating_add(r.duration_ms);
        slot.2 = slot.2.saturating_add(u64::from(r.accuracy_pct));
    }

    let mut day = Weekday::Mon;
    totals
        .iter()
        .map(|&(count, duration_ms, accuracy)| {
            let pattern = WeekdayPattern {
                weekday: day,
                count,
                average_duration_sec: mean(duration_ms as f64 / 1000.0, count),
                average_accuracy_pct: mean(accuracy as f64, count),
            };
            day = day.succ();
            pattern
        })
        .collect()
}

fn best_hour(records: &[&SessionRecord]) -> Option<HourSummary> {
    let mut totals = [(0u64, 0u64); 24];
    for r in records {
        let slot = &mut totals[r.started_at.with_timezone(&Local).hour() as usize];
        slot.0 += 1;
        slot.1 = slot.1.saturating_add(u64::from(r.accuracy_pct));
    }

    totals
        .iter()
        .enumerate()
        .filter(|(_, (count, _))| *count > 0)
        .map(|(hour, &(count, accuracy))| HourSummary {
            hour: hour as u32,
            count,
            average_accuracy_pct: mean(accuracy as f64, count),
        })
        // Earliest hour wins ties: `max_by` keeps the last maximum, so walk backwards.
        .rev()
        .max_by(|a, b| a.average_accuracy_pct.total_cmp(&b.average_accuracy_pct))
}

fn mean(total: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
