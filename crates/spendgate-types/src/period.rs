//! Calendar period windows
//!
//! A `Period` buckets time into half-open, calendar-aligned UTC windows.
//! `window_for` is pure and deterministic: the same instant always maps to
//! the same window.
//!
//! Weeks are fixed 7-day blocks anchored at 1970-01-05T00:00:00Z — the first
//! Monday after the Unix epoch — so every window starts on a Monday at
//! midnight UTC. This is a fixed partition, not a sliding 7-day lookback.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The calendar period a spend limit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
}

impl Period {
    /// The canonical calendar window containing `at`.
    pub fn window_for(&self, at: DateTime<Utc>) -> PeriodWindow {
        let date = at.date_naive();
        let (start, end) = match self {
            Self::Day => (date, date + Days::new(1)),
            Self::Week => {
                // Monday-aligned: every Monday is a whole number of weeks
                // from the 1970-01-05 anchor.
                let start = date - Days::new(u64::from(date.weekday().num_days_from_monday()));
                (start, start + Days::new(7))
            }
            Self::Month => {
                let start = first_of_month(date.year(), date.month());
                let end = if date.month() == 12 {
                    first_of_month(date.year() + 1, 1)
                } else {
                    first_of_month(date.year(), date.month() + 1)
                };
                (start, end)
            }
            Self::Year => (
                first_of_month(date.year(), 1),
                first_of_month(date.year() + 1, 1),
            ),
        };
        PeriodWindow {
            start: midnight(start),
            end: midnight(end),
        }
    }

    /// Whether two instants fall in the same window of this period.
    pub fn same_window(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.window_for(a) == self.window_for(b)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        };
        write!(f, "{s}")
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("first of month is a valid date")
}

/// A half-open calendar-aligned interval `[start, end)`
///
/// Equality of the start instant defines "same period".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PeriodWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

impl fmt::Display for PeriodWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
