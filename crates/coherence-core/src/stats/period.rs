use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;

/// Time window for session queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Same local calendar date as now.
    Today,
    /// The last 7 × 24 hours.
    #[default]
    Week,
    /// Since the first day of the current local month.
    Month,
    All,
}

impl Period {
    pub fn contains(&self, record: &SessionRecord, now: DateTime<Local>) -> bool {
        match self {
            Period::Today => record.local_day() == now.date_naive(),
            Period::Week => record.started_at >= (now - Duration::days(7)).with_timezone(&Utc),
            Period::Month => {
                let today = now.date_naive();
                // `with_day(1)` cannot fail for a valid date.
                let first = today.with_day(1).unwrap_or(today);
                record.local_day() >= first
            }
            Period::All => true,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Week => "week",
            Period::Month => "month",
            Period::All => "all",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "all" => Ok(Period::All),
            other => Err(format!(
                "unknown period '{other}' (expected today, week, month or all)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn started(when: DateTime<Local>) -> SessionRecord {
        SessionRecord::from_measurements(when.with_timezone(&Utc), 300_000, 30, 10_000, 280_000)
    }

    #[test]
    fn today_is_calendar_date() {
        let now = at(2024, 3, 15, 12);
        assert!(Period::Today.contains(&started(at(2024, 3, 15, 0)), now));
        assert!(Period::Today.contains(&started(at(2024, 3, 15, 23)), now));
        assert!(!Period::Today.contains(&started(at(2024, 3, 14, 23)), now));
    }

    #[test]
    fn week_is_rolling_seven_days() {
        let now = at(2024, 3, 15, 12);
        assert!(Period::Week.contains(&started(at(2024, 3, 8, 13)), now));
        assert!(!Period::Week.contains(&started(at(2024, 3, 8, 11)), now));
    }

    #[test]
    fn month_starts_on_the_first() {
        let now = at(2024, 3, 15, 12);
        assert!(Period::Month.contains(&started(at(2024, 3, 1, 0)), now));
        assert!(!Period::Month.contains(&started(at(2024, 2, 29, 23)), now));
        assert!(Period::All.contains(&started(at(2001, 1, 1, 0)), now));
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("TODAY".parse::<Period>(), Ok(Period::Today));
        assert_eq!("all".parse::<Period>(), Ok(Period::All));
        assert!("year".parse::<Period>().is_err());
        assert_eq!(Period::Month.to_string(), "month");
    }
}
