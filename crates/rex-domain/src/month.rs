//! Calendar month arithmetic used to anchor recurring expenses.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building months or windows from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MonthError {
    #[error("month {month} of year {year} is out of range (expected 1-12)")]
    OutOfRange { year: i32, month: u32 },
    #[error("invalid month literal `{0}` (expected YYYY-MM)")]
    Malformed(String),
    #[error("window end {end} is before start {start}")]
    InvertedWindow { start: NaiveDate, end: NaiveDate },
}

/// Number of days in `month` of `year`, accounting for leap years.
pub fn last_day_of_month(year: i32, month: u32) -> Result<u32, MonthError> {
    YearMonth::new(year, month).map(YearMonth::days)
}

/// The month immediately before `(year, month)`, rolling January back to
/// December of the previous year.
pub fn previous_month(year: i32, month: u32) -> Result<YearMonth, MonthError> {
    YearMonth::new(year, month).map(YearMonth::previous)
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// A calendar month. Ordering is chronological.
///
/// Only valid months can be built: through [`YearMonth::new`], from a date,
/// or by deserializing a `{ "year", "month" }` object that passes the same
/// checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawYearMonth", into = "RawYearMonth")]
pub struct YearMonth {
    first: NaiveDate,
}

#[derive(Serialize, Deserialize)]
struct RawYearMonth {
    year: i32,
    month: u32,
}

impl TryFrom<RawYearMonth> for YearMonth {
    type Error = MonthError;

    fn try_from(raw: RawYearMonth) -> Result<Self, Self::Error> {
        YearMonth::new(raw.year, raw.month)
    }
}

impl From<YearMonth> for RawYearMonth {
    fn from(month: YearMonth) -> Self {
        Self {
            year: month.year(),
            month: month.month(),
        }
    }
}

impl YearMonth {
    /// Builds a month, rejecting values outside `1..=12` and years the
    /// calendar cannot represent.
    pub fn new(year: i32, month: u32) -> Result<Self, MonthError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|first| Self { first })
            .ok_or(MonthError::OutOfRange { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            first: date - Duration::days(i64::from(date.day0())),
        }
    }

    pub fn year(self) -> i32 {
        self.first.year()
    }

    pub fn month(self) -> u32 {
        self.first.month()
    }

    pub fn days(self) -> u32 {
        match self.month() {
            2 if is_leap_year(self.year()) => 29,
            2 => 28,
            4 | 6 | 9 | 11 => 30,
            _ => 31,
        }
    }

    /// Previous month. Saturates at the earliest representable month.
    pub fn previous(self) -> Self {
        self.first.pred_opt().map(Self::from_date).unwrap_or(self)
    }

    /// Next month. Saturates at the latest representable month.
    pub fn next(self) -> Self {
        self.last_day().succ_opt().map(Self::from_date).unwrap_or(self)
    }

    /// First calendar day of the month.
    pub fn first_day(self) -> NaiveDate {
        self.first
    }

    /// Last calendar day of the month.
    pub fn last_day(self) -> NaiveDate {
        self.first + Duration::days(i64::from(self.days()) - 1)
    }

    /// Number of months from `self` to `other`, negative when `other` is earlier.
    pub fn months_until(self, other: YearMonth) -> i32 {
        (other.year() - self.year()) * 12 + other.month() as i32 - self.month() as i32
    }

    /// Iterates every month from `self` to `end`, both inclusive.
    pub fn iter_through(self, end: YearMonth) -> impl Iterator<Item = YearMonth> {
        let mut cursor = Some(self);
        std::iter::from_fn(move || {
            let current = cursor?;
            if current > end {
                cursor = None;
                return None;
            }
            let next = current.next();
            cursor = (next != current).then_some(next);
            Some(current)
        })
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = MonthError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| MonthError::Malformed(trimmed.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| MonthError::Malformed(trimmed.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| MonthError::Malformed(trimmed.to_string()))?;
        YearMonth::new(year, month)
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, MonthError> {
        if end < start {
            return Err(MonthError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window spanning the first day of `from` through the last day of `to`.
    pub fn for_months(from: YearMonth, to: YearMonth) -> Result<Self, MonthError> {
        Self::new(from.first_day(), to.last_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// True when `[start, end]` (open-ended when `end` is `None`) shares at least one day.
    pub fn overlaps(&self, start: NaiveDate, end: Option<NaiveDate>) -> bool {
        start <= self.end && end.map_or(true, |end| end >= self.start)
    }
}
