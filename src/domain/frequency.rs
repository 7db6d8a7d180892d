use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::days_in_month;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrequencyError {
    #[error("interval must be a positive number of days, got {0}")]
    InvalidInterval(i64),
    #[error("day of month must be between 1 and 31, got {0}")]
    InvalidDayOfMonth(i64),
    #[error("'{0}' requires a parameter")]
    MissingParameter(&'static str),
    #[error("unknown frequency '{0}' (expected weekly, biweekly, monthly, every:N or day:D)")]
    Unknown(String),
}

/// Target day for [`Frequency::MonthlyOnDay`]. Always within 1..=31; months shorter than the
/// target day clamp to their last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct DayOfMonth(u32);

impl DayOfMonth {
    pub fn new(day: u32) -> Result<Self, FrequencyError> {
        if (1..=31).contains(&day) {
            Ok(Self(day))
        } else {
            Err(FrequencyError::InvalidDayOfMonth(day as i64))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for DayOfMonth {
    type Error = FrequencyError;

    fn try_from(day: u32) -> Result<Self, Self::Error> {
        Self::new(day)
    }
}

impl From<DayOfMonth> for u32 {
    fn from(day: DayOfMonth) -> Self {
        day.0
    }
}

/// How often a recurring schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Frequency {
    Weekly,
    Biweekly,
    EveryNDays(NonZeroU32),
    Monthly,
    MonthlyOnDay(DayOfMonth),
}

impl Frequency {
    pub fn every_n_days(days: i64) -> Result<Self, FrequencyError> {
        u32::try_from(days)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Frequency::EveryNDays)
            .ok_or(FrequencyError::InvalidInterval(days))
    }

    pub fn monthly_on_day(day: i64) -> Result<Self, FrequencyError> {
        let day = u32::try_from(day).map_err(|_| FrequencyError::InvalidDayOfMonth(day))?;
        Ok(Frequency::MonthlyOnDay(DayOfMonth::new(day)?))
    }

    /// Storage tag, paired with [`Frequency::parameter`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::EveryNDays(_) => "every_n_days",
            Frequency::Monthly => "monthly",
            Frequency::MonthlyOnDay(_) => "monthly_dom",
        }
    }

    pub fn parameter(&self) -> Option<u32> {
        match self {
            Frequency::EveryNDays(n) => Some(n.get()),
            Frequency::MonthlyOnDay(day) => Some(day.get()),
            _ => None,
        }
    }

    /// Rebuild a frequency from its storage tag and optional parameter.
    pub fn from_parts(tag: &str, parameter: Option<i64>) -> Result<Self, FrequencyError> {
        match tag.to_lowercase().as_str() {
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            "every_n_days" => Frequency::every_n_days(
                parameter.ok_or(FrequencyError::MissingParameter("every_n_days"))?,
            ),
            "monthly_dom" => Frequency::monthly_on_day(
                parameter.ok_or(FrequencyError::MissingParameter("monthly_dom"))?,
            ),
            other => Err(FrequencyError::Unknown(other.to_string())),
        }
    }

    /// Next occurrence after `date`.
    ///
    /// Day-based rules add a fixed number of days. `Monthly` keeps the day of month and clamps
    /// to the end of shorter months (Jan 31 -> Feb 28/29). `MonthlyOnDay` moves to the next
    /// month and re-clamps its own target day there, ignoring the anchor's day.
    ///
    /// Never returns a date earlier than `date`; saturates at the end of the supported range.
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        let next = match self {
            Frequency::Weekly => date.checked_add_days(Days::new(7)),
            Frequency::Biweekly => date.checked_add_days(Days::new(14)),
            Frequency::EveryNDays(n) => date.checked_add_days(Days::new(u64::from(n.get()))),
            Frequency::Monthly => next_month_clamped(date, date.day()),
            Frequency::MonthlyOnDay(day) => next_month_clamped(date, day.get()),
        };
        next.unwrap_or(NaiveDate::MAX)
    }
}

fn next_month_clamped(date: NaiveDate, day: u32) -> Option<NaiveDate> {
    let first_of_next = date.with_day(1)?.checked_add_months(Months::new(1))?;
    let last = days_in_month(first_of_next.year(), first_of_next.month())?;
    first_of_next.with_day(day.min(last))
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::EveryNDays(n) => write!(f, "every {} days", n),
            Frequency::MonthlyOnDay(day) => write!(f, "monthly on day {}", day.get()),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Accepts `weekly`, `biweekly`, `monthly`, `every:N` and `day:D`
/// (plus the storage spellings `every_n_days:N` / `monthly_dom:D`).
impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (tag, parameter) = match s.split_once(':') {
            Some((tag, value)) => {
                let value: i64 = value
                    .trim()
                    .parse()
                    .map_err(|_| FrequencyError::Unknown(s.clone()))?;
                (tag.trim(), Some(value))
            }
            None => (s.as_str(), None),
        };

        let tag = match tag {
            "every" | "every_n_days" => "every_n_days",
            "day" | "monthly_dom" => "monthly_dom",
            "weekly" | "biweekly" | "monthly" if parameter.is_none() => tag,
            _ => return Err(FrequencyError::Unknown(s.clone())),
        };
        Frequency::from_parts(tag, parameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn every(n: i64) -> Frequency {
        Frequency::every_n_days(n).unwrap()
    }

    fn on_day(day: i64) -> Frequency {
        Frequency::monthly_on_day(day).unwrap()
    }

    #[test]
    fn test_day_based_rules() {
        let start = d(2025, 1, 1);
        assert_eq!(Frequency::Weekly.advance(start), d(2025, 1, 8));
        assert_eq!(Frequency::Biweekly.advance(start), d(2025, 1, 15));
        assert_eq!(every(3).advance(start), d(2025, 1, 4));
        assert_eq!(every(1).advance(d(2024, 12, 31)), d(2025, 1, 1));
        assert_eq!(Frequency::Weekly.advance(d(2024, 2, 26)), d(2024, 3, 4));
        assert_eq!(Frequency::Weekly.advance(d(2025, 2, 26)), d(2025, 3, 5));
    }

    #[test]
    fn test_monthly_keeps_day() {
        assert_eq!(Frequency::Monthly.advance(d(2025, 1, 15)), d(2025, 2, 15));
        assert_eq!(Frequency::Monthly.advance(d(2025, 12, 15)), d(2026, 1, 15));
        assert_eq!(Frequency::Monthly.advance(d(2025, 3, 31)), d(2025, 4, 30));
        assert_eq!(Frequency::Monthly.advance(d(2025, 4, 30)), d(2025, 5, 30));
    }

    #[test]
    fn test_monthly_clamps_to_short_months() {
        assert_eq!(Frequency::Monthly.advance(d(2025, 1, 31)), d(2025, 2, 28));
        assert_eq!(Frequency::Monthly.advance(d(2024, 1, 31)), d(2024, 2, 29));
        assert_eq!(Frequency::Monthly.advance(d(2024, 1, 30)), d(2024, 2, 29));
        assert_eq!(Frequency::Monthly.advance(d(2025, 1, 29)), d(2025, 2, 28));
        assert_eq!(Frequency::Monthly.advance(d(2025, 5, 31)), d(2025, 6, 30));
        assert_eq!(Frequency::Monthly.advance(d(2025, 8, 31)), d(2025, 9, 30));
        // Never rolls into the following month.
        assert_eq!(Frequency::Monthly.advance(d(2025, 1, 31)).month(), 2);
    }

    #[test]
    fn test_monthly_drifts_after_clamping() {
        // The clamped day becomes the new anchor.
        let feb = Frequency::Monthly.advance(d(2025, 1, 31));
        assert_eq!(Frequency::Monthly.advance(feb), d(2025, 3, 28));
    }

    #[test]
    fn test_monthly_on_day() {
        assert_eq!(on_day(15).advance(d(2025, 1, 10)), d(2025, 2, 15));
        assert_eq!(on_day(31).advance(d(2025, 1, 31)), d(2025, 2, 28));
        assert_eq!(on_day(31).advance(d(2024, 1, 31)), d(2024, 2, 29));
        assert_eq!(on_day(30).advance(d(2025, 2, 28)), d(2025, 3, 30));
        assert_eq!(on_day(31).advance(d(2025, 3, 31)), d(2025, 4, 30));
        assert_eq!(on_day(1).advance(d(2025, 12, 20)), d(2026, 1, 1));
    }

    #[test]
    fn test_monthly_on_day_does_not_inherit_anchor_day() {
        // After the February clamp, March returns to the 31st.
        let feb = on_day(31).advance(d(2025, 1, 31));
        assert_eq!(on_day(31).advance(feb), d(2025, 3, 31));
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let rules = [
            Frequency::Weekly,
            Frequency::Biweekly,
            every(1),
            every(45),
            Frequency::Monthly,
            on_day(1),
            on_day(28),
            on_day(31),
        ];
        let mut date = d(2023, 12, 1);
        while date < d(2025, 3, 1) {
            for rule in &rules {
                assert!(rule.advance(date) > date, "{rule} from {date}");
            }
            date = date.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_advance_saturates() {
        assert_eq!(Frequency::Weekly.advance(NaiveDate::MAX), NaiveDate::MAX);
        assert_eq!(Frequency::Monthly.advance(NaiveDate::MAX), NaiveDate::MAX);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert_eq!(
            Frequency::every_n_days(0),
            Err(FrequencyError::InvalidInterval(0))
        );
        assert_eq!(
            Frequency::every_n_days(-3),
            Err(FrequencyError::InvalidInterval(-3))
        );
        assert_eq!(
            Frequency::monthly_on_day(0),
            Err(FrequencyError::InvalidDayOfMonth(0))
        );
        assert_eq!(
            Frequency::monthly_on_day(32),
            Err(FrequencyError::InvalidDayOfMonth(32))
        );
        assert_eq!(
            Frequency::from_parts("every_n_days", None),
            Err(FrequencyError::MissingParameter("every_n_days"))
        );
    }

    #[test]
    fn test_parse() {
        assert_eq!("weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert_eq!(" Biweekly ".parse::<Frequency>(), Ok(Frequency::Biweekly));
        assert_eq!("monthly".parse::<Frequency>(), Ok(Frequency::Monthly));
        assert_eq!("every:10".parse::<Frequency>(), Ok(every(10)));
        assert_eq!("every_n_days:10".parse::<Frequency>(), Ok(every(10)));
        assert_eq!("day:15".parse::<Frequency>(), Ok(on_day(15)));
        assert!("day:0".parse::<Frequency>().is_err());
        assert!("weekly:3".parse::<Frequency>().is_err());
        assert!("yearly".parse::<Frequency>().is_err());
        assert!("every:x".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_storage_parts() {
        let rule = on_day(15);
        assert_eq!(rule.as_str(), "monthly_dom");
        assert_eq!(rule.parameter(), Some(15));
        assert_eq!(
            Frequency::from_parts(rule.as_str(), rule.parameter().map(i64::from)),
            Ok(rule)
        );
        assert_eq!(Frequency::Weekly.parameter(), None);
    }
}
