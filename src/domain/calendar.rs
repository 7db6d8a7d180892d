use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("invalid month key '{0}' (expected YYYY-MM)")]
    InvalidMonthKey(String),
}

/// Number of days in the given calendar month, or `None` if the month does not exist.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.signed_duration_since(first).num_days() as u32)
}

/// Inclusive first..=last day range of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidMonth { year, month };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = days_in_month(year, month).ok_or_else(invalid)?;
        let end = NaiveDate::from_ymd_opt(year, month, last).ok_or_else(invalid)?;
        Ok(Self {
            year,
            month,
            start,
            end,
        })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = days_in_month(date.year(), date.month())
            .and_then(|last| date.with_day(last))
            .unwrap_or(date);
        Self {
            year: date.year(),
            month: date.month(),
            start,
            end,
        }
    }

    /// Parse a `YYYY-MM` key.
    pub fn parse_key(key: &str) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidMonthKey(key.to_string());
        let (year, month) = key.trim().split_once('-').ok_or_else(invalid)?;
        if month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }

    pub fn key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn previous(&self) -> Self {
        match self.start.checked_sub_months(Months::new(1)) {
            Some(date) => Self::containing(date),
            None => *self,
        }
    }
}

impl std::fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2025, 1), Some(31));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2025, 4), Some(30));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
    }

    #[test]
    fn test_month_window_bounds() {
        let window = MonthWindow::new(2024, 2).unwrap();
        assert_eq!(window.start, d(2024, 2, 1));
        assert_eq!(window.end, d(2024, 2, 29));
        assert!(window.contains(d(2024, 2, 29)));
        assert!(!window.contains(d(2024, 3, 1)));
        assert_eq!(window.key(), "2024-02");
    }

    #[test]
    fn test_month_window_rejects_bad_month() {
        assert_eq!(
            MonthWindow::new(2025, 0),
            Err(CalendarError::InvalidMonth {
                year: 2025,
                month: 0
            })
        );
        assert!(MonthWindow::new(2025, 13).is_err());
    }

    #[test]
    fn test_parse_key_and_previous() {
        let window = MonthWindow::parse_key("2025-01").unwrap();
        assert_eq!(window.previous().key(), "2024-12");
        assert!(MonthWindow::parse_key("2025-1").is_err());
        assert!(MonthWindow::parse_key("january").is_err());
        assert!(MonthWindow::parse_key("2025-13").is_err());
    }
}
