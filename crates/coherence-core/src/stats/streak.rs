//! Consecutive-day streaks.
//!
//! All streak math runs on local calendar dates, never on raw timestamps:
//! a session at 23:50 and one at 00:10 the next morning are one day apart,
//! not 20 minutes apart.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;

/// A run of consecutive practice days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakRun {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub length: u32,
}

/// Distinct local days holding at least one completed session.
pub fn completed_days<'a>(records: impl IntoIterator<Item = &'a SessionRecord>) -> BTreeSet<NaiveDate> {
    records
        .into_iter()
        .filter(|r| r.completed)
        .map(SessionRecord::local_day)
        .collect()
}

/// Streak ending today, or ending yesterday when nothing is done yet today.
///
/// Zero when the latest day in `days` is older than yesterday.
pub fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let anchor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    let mut day = Some(anchor);
    while let Some(d) = day.filter(|d| days.contains(d)) {
        streak += 1;
        day = d.pred_opt();
    }
    streak
}

/// Longest run of consecutive days anywhere in `days`.
pub fn best_streak(days: &BTreeSet<NaiveDate>) -> u32 {
    runs(days).map(|run| run.length).max().unwrap_or(0)
}

/// Runs of two or more consecutive days, longest first (ties: most recent
/// first).
pub fn practice_runs(days: &BTreeSet<NaiveDate>) -> Vec<StreakRun> {
    let mut runs: Vec<StreakRun> = runs(days).filter(|run| run.length > 1).collect();
    runs.sort_by(|a, b| b.length.cmp(&a.length).then(b.end.cmp(&a.end)));
    runs
}

fn runs(days: &BTreeSet<NaiveDate>) -> impl Iterator<Item = StreakRun> + '_ {
    let mut current: Option<StreakRun> = None;
    let mut iter = days.iter();
    std::iter::from_fn(move || {
        for &day in iter.by_ref() {
            match current.as_mut() {
                Some(run) if (day - run.end).num_days() == 1 => {
                    run.end = day;
                    run.length += 1;
                }
                Some(run) => {
                    let finished = *run;
                    current = Some(StreakRun {
                        start: day,
                        end: day,
                        length: 1,
                    });
                    return Some(finished);
                }
                None => {
                    current = Some(StreakRun {
                        start: day,
                        end: day,
                        length: 1,
                    });
                }
            }
        }
        current.take()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn set(days: &[u32]) -> BTreeSet<NaiveDate> {
        days.iter().map(|&day| d(day)).collect()
    }

    #[test]
    fn empty_has_no_streaks() {
        let days = BTreeSet::new();
        assert_eq!(current_streak(&days, d(15)), 0);
        assert_eq!(best_streak(&days), 0);
        assert!(practice_runs(&days).is_empty());
    }

    #[test]
    fn current_streak_anchored_today() {
        assert_eq!(current_streak(&set(&[13, 14, 15]), d(15)), 3);
    }

    #[test]
    fn current_streak_anchored_yesterday() {
        assert_eq!(current_streak(&set(&[12, 13, 14]), d(15)), 3);
    }

    #[test]
    fn current_streak_broken_two_days_ago() {
        assert_eq!(current_streak(&set(&[11, 12, 13]), d(15)), 0);
    }

    #[test]
    fn current_streak_stops_at_first_gap() {
        assert_eq!(current_streak(&set(&[9, 10, 11, 13, 14, 15]), d(15)), 3);
    }

    #[test]
    fn best_streak_across_gap() {
        assert_eq!(best_streak(&set(&[1, 2, 3, 5, 6])), 3);
        assert_eq!(best_streak(&set(&[1, 3, 4, 5, 6])), 4);
        assert_eq!(best_streak(&set(&[7])), 1);
    }

    #[test]
    fn best_streak_crosses_month_boundary() {
        let days: BTreeSet<NaiveDate> = [
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(best_streak(&days), 3);
    }

    #[test]
    fn runs_sorted_longest_first() {
        let runs = practice_runs(&set(&[1, 2, 4, 6, 7, 8, 10, 11]));
        let lengths: Vec<u32> = runs.iter().map(|r| r.length).collect();
        assert_eq!(lengths, vec![3, 2, 2]);
        assert_eq!(runs[0].start, d(6));
        assert_eq!(runs[0].end, d(8));
        assert_eq!(runs[1].end, d(11));
    }
}
