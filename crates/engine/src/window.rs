//! Reporting windows: a calendar month or an explicit inclusive date range.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month. Always holds a valid first day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> ResultEngine<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| EngineError::InvalidDate(format!("invalid month {year}-{month:02}")))
    }

    /// Month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self(date.with_day0(0).unwrap_or(date))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    pub fn last_day(self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn next(self) -> Self {
        Self(self.0.checked_add_months(Months::new(1)).unwrap_or(self.0))
    }

    pub fn prev(self) -> Self {
        Self(self.0.checked_sub_months(Months::new(1)).unwrap_or(self.0))
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        Month::of(date) == self
    }

    /// `"January 2024"`.
    pub fn label(self) -> String {
        let name = MONTH_NAMES[self.0.month0() as usize];
        format!("{name} {}", self.0.year())
    }

    /// Every month from `start`'s month to `end`'s month, inclusive. Empty
    /// when `start` is after `end`.
    pub fn span(start: NaiveDate, end: NaiveDate) -> Vec<Month> {
        let last = Month::of(end);
        let mut current = Month::of(start);
        let mut out = Vec::new();
        while current <= last {
            out.push(current);
            let next = current.next();
            if next == current {
                break;
            }
            current = next;
        }
        out
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.0.year(), self.0.month())
    }
}

impl std::str::FromStr for Month {
    type Err = EngineError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidDate(format!("expected YYYY-MM, got {s}"));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Month::new(year, month)
    }
}

/// Selected reporting window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportWindow {
    Month(Month),
    /// Inclusive on both ends.
    Range { start: NaiveDate, end: NaiveDate },
}

impl ReportWindow {
    pub fn month(month: Month) -> Self {
        Self::Month(month)
    }

    pub fn range(start: NaiveDate, end: NaiveDate) -> ResultEngine<Self> {
        if start > end {
            return Err(EngineError::InvalidDate(
                "invalid range: start must be <= end".to_string(),
            ));
        }
        Ok(Self::Range { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        match self {
            Self::Month(month) => month.first_day(),
            Self::Range { start, .. } => *start,
        }
    }

    pub fn end(&self) -> NaiveDate {
        match self {
            Self::Month(month) => month.last_day(),
            Self::Range { end, .. } => *end,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start() <= date && date <= self.end()
    }

    /// Everything up to and including the window end.
    pub fn reaches(&self, date: NaiveDate) -> bool {
        date <= self.end()
    }
}

impl From<Month> for ReportWindow {
    fn from(month: Month) -> Self {
        Self::Month(month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_bounds() {
        let feb = Month::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert_eq!(feb.next(), Month::new(2024, 3).unwrap());
        assert_eq!(Month::new(2024, 1).unwrap().prev(), Month::new(2023, 12).unwrap());
        assert_eq!(Month::new(2023, 12).unwrap().last_day(), date(2023, 12, 31));
    }

    #[test]
    fn month_span_is_inclusive() {
        let months = Month::span(date(2023, 11, 20), date(2024, 2, 3));
        let labels: Vec<String> = months.iter().map(|m| m.label()).collect();
        assert_eq!(
            labels,
            vec!["November 2023", "December 2023", "January 2024", "February 2024"]
        );
        assert!(Month::span(date(2024, 2, 1), date(2024, 1, 1)).is_empty());
    }

    #[test]
    fn month_parses_from_str() {
        assert_eq!("2024-05".parse::<Month>().unwrap(), Month::new(2024, 5).unwrap());
        assert!("2024-13".parse::<Month>().is_err());
        assert!("May".parse::<Month>().is_err());
    }

    #[test]
    fn window_contains() {
        let window = ReportWindow::month(Month::new(2024, 3).unwrap());
        assert!(window.contains(date(2024, 3, 31)));
        assert!(!window.contains(date(2024, 4, 1)));
        assert!(window.reaches(date(2020, 1, 1)));

        assert!(ReportWindow::range(date(2024, 3, 2), date(2024, 3, 1)).is_err());
    }
}
