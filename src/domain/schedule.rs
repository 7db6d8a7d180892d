use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Cents, CategoryId, Frequency, MAX_AMOUNT_CENTS};

pub type ScheduleId = Uuid;

/// Highest day a persisted `MonthlyOnDay` schedule may target.
pub const MAX_SCHEDULE_DAY_OF_MONTH: u32 = 28;

/// Whether a schedule produces money going out or coming in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Expense => "expense",
            EntryKind::Income => "income",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "expense" => Some(EntryKind::Expense),
            "income" => Some(EntryKind::Income),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a posted occurrence is filed. The variant always matches the schedule's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum Binding {
    /// Expense schedules point at a category; `None` falls back to the default category.
    Expense { category_id: Option<CategoryId> },
    /// Income schedules carry a free-text source label.
    Income { source: Option<String> },
}

impl Binding {
    pub fn kind(&self) -> EntryKind {
        match self {
            Binding::Expense { .. } => EntryKind::Expense,
            Binding::Income { .. } => EntryKind::Income,
        }
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        match self {
            Binding::Expense { category_id } => *category_id,
            Binding::Income { .. } => None,
        }
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Binding::Expense { .. } => None,
            Binding::Income { source } => source.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Cents),
    #[error("amount of {0} cents exceeds the maximum of {max} cents", max = MAX_AMOUNT_CENTS)]
    AmountTooLarge(Cents),
    #[error("schedule name cannot be empty")]
    EmptyName,
    #[error("day of month for a recurring schedule must be between 1 and {max}, got {0}", max = MAX_SCHEDULE_DAY_OF_MONTH)]
    DayOfMonthOutOfRange(u32),
    #[error("end date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("next run date {next} is before start date {start}")]
    NextRunBeforeStart { start: NaiveDate, next: NaiveDate },
}

/// A repeating bill, subscription or paycheck.
///
/// `next_run_date` is the only piece of scheduler state; it moves forward exclusively through
/// [`RecurringSchedule::catch_up`] and [`RecurringSchedule::run_once`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub id: ScheduleId,
    pub name: String,
    pub amount_cents: Cents,
    pub binding: Binding,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub next_run_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub auto_post: bool,
    pub active: bool,
    pub notes: Option<String>,
    /// Optimistic concurrency counter, bumped on every persisted change.
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Result of simulating the due scan for one schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchUp {
    /// Occurrence dates to post, oldest first.
    pub occurrences: Vec<NaiveDate>,
    pub next_run_date: NaiveDate,
    pub active: bool,
    /// True when the backlog cap stopped the scan while occurrences were still due.
    pub truncated: bool,
}

impl CatchUp {
    pub fn changes(&self, schedule: &RecurringSchedule) -> bool {
        !self.occurrences.is_empty()
            || self.next_run_date != schedule.next_run_date
            || self.active != schedule.active
    }
}

/// Result of a manual "run once".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOnce {
    /// Post this occurrence; the schedule moves on to `next_run_date`.
    Post {
        occurrence: NaiveDate,
        next_run_date: NaiveDate,
        active: bool,
    },
    /// The next run lies past the end date; the schedule is retired without posting.
    Expired,
}

impl RecurringSchedule {
    /// Create an active, auto-posting schedule whose first run is its start date.
    pub fn new(
        name: impl Into<String>,
        amount_cents: Cents,
        binding: Binding,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            amount_cents,
            binding,
            frequency,
            start_date,
            next_run_date: start_date,
            end_date: None,
            auto_post: true,
            active: true,
            notes: None,
            version: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_next_run_date(mut self, next_run_date: NaiveDate) -> Self {
        self.next_run_date = next_run_date;
        self
    }

    pub fn with_auto_post(mut self, auto_post: bool) -> Self {
        self.auto_post = auto_post;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn kind(&self) -> EntryKind {
        self.binding.kind()
    }

    /// Check the definition invariants. Runs on every create and edit.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.name.trim().is_empty() {
            return Err(ScheduleError::EmptyName);
        }
        if self.amount_cents <= 0 {
            return Err(ScheduleError::NonPositiveAmount(self.amount_cents));
        }
        if self.amount_cents > MAX_AMOUNT_CENTS {
            return Err(ScheduleError::AmountTooLarge(self.amount_cents));
        }
        if let Frequency::MonthlyOnDay(day) = self.frequency {
            if day.get() > MAX_SCHEDULE_DAY_OF_MONTH {
                return Err(ScheduleError::DayOfMonthOutOfRange(day.get()));
            }
        }
        match self.end_date {
            Some(end) if end < self.start_date => {
                return Err(ScheduleError::EndBeforeStart {
                    start: self.start_date,
                    end,
                });
            }
            _ => {}
        }
        if self.next_run_date < self.start_date {
            return Err(ScheduleError::NextRunBeforeStart {
                start: self.start_date,
                next: self.next_run_date,
            });
        }
        Ok(())
    }

    /// True when `date` lies beyond the end date.
    pub fn is_past_end(&self, date: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| date > end)
    }

    /// Simulate the due scan up to and including `today`.
    ///
    /// Every due occurrence still within the end date is returned, each at its own date, and the
    /// run date is advanced past it. Once the run date passes the end date the schedule is
    /// deactivated. `max_occurrences` bounds the catch-up; the remainder stays due.
    pub fn catch_up(&self, today: NaiveDate, max_occurrences: Option<usize>) -> CatchUp {
        let mut next = self.next_run_date;
        let mut occurrences = Vec::new();
        let mut truncated = false;

        let mut stuck = false;

        while next <= today && !self.is_past_end(next) {
            if max_occurrences.is_some_and(|max| occurrences.len() >= max) {
                truncated = true;
                break;
            }
            occurrences.push(next);
            let advanced = self.frequency.advance(next);
            if advanced == next {
                // End of the calendar; the schedule cannot move on.
                stuck = true;
                break;
            }
            next = advanced;
        }

        CatchUp {
            occurrences,
            next_run_date: next,
            active: self.active && !stuck && !self.is_past_end(next),
            truncated,
        }
    }

    /// Dates the due scan would post for `today`, without the backlog cap. Manual-only and
    /// inactive schedules have none.
    pub fn pending_occurrences(&self, today: NaiveDate) -> Vec<NaiveDate> {
        if !self.active || !self.auto_post {
            return Vec::new();
        }
        self.catch_up(today, None).occurrences
    }

    /// Single step of the due scan, regardless of `auto_post`, `active`, or whether the run date
    /// has arrived. The end date still applies.
    pub fn run_once(&self) -> RunOnce {
        let occurrence = self.next_run_date;
        if self.is_past_end(occurrence) {
            return RunOnce::Expired;
        }
        let next_run_date = self.frequency.advance(occurrence);
        RunOnce::Post {
            occurrence,
            next_run_date,
            active: self.active && next_run_date != occurrence && !self.is_past_end(next_run_date),
        }
    }

    /// Marker placed on every ledger entry posted from this schedule.
    pub fn entry_description(&self) -> String {
        format!("[Recurring] {}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn monthly_expense(start: NaiveDate) -> RecurringSchedule {
        RecurringSchedule::new(
            "Gym",
            2000,
            Binding::Expense { category_id: None },
            Frequency::Monthly,
            start,
        )
    }

    #[test]
    fn test_entry_kind_roundtrip() {
        for kind in [EntryKind::Expense, EntryKind::Income] {
            assert_eq!(EntryKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(EntryKind::from_str("transfer"), None);
    }

    #[test]
    fn test_new_schedule_starts_at_start_date() {
        let schedule = monthly_expense(d(2025, 1, 1));
        assert_eq!(schedule.next_run_date, d(2025, 1, 1));
        assert!(schedule.active);
        assert!(schedule.auto_post);
        assert_eq!(schedule.kind(), EntryKind::Expense);
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_definitions() {
        let mut schedule = monthly_expense(d(2025, 1, 1));
        schedule.amount_cents = 0;
        assert_eq!(
            schedule.validate(),
            Err(ScheduleError::NonPositiveAmount(0))
        );

        let schedule = monthly_expense(d(2025, 1, 10)).with_end_date(d(2025, 1, 1));
        assert!(matches!(
            schedule.validate(),
            Err(ScheduleError::EndBeforeStart { .. })
        ));

        let schedule = monthly_expense(d(2025, 1, 10)).with_next_run_date(d(2025, 1, 9));
        assert!(matches!(
            schedule.validate(),
            Err(ScheduleError::NextRunBeforeStart { .. })
        ));

        let mut schedule = monthly_expense(d(2025, 1, 1));
        schedule.frequency = Frequency::monthly_on_day(30).unwrap();
        assert_eq!(
            schedule.validate(),
            Err(ScheduleError::DayOfMonthOutOfRange(30))
        );

        let mut schedule = monthly_expense(d(2025, 1, 1));
        schedule.amount_cents = MAX_AMOUNT_CENTS + 1;
        assert_eq!(
            schedule.validate(),
            Err(ScheduleError::AmountTooLarge(MAX_AMOUNT_CENTS + 1))
        );
        schedule.amount_cents = MAX_AMOUNT_CENTS;
        assert!(schedule.validate().is_ok());

        let mut schedule = monthly_expense(d(2025, 1, 1));
        schedule.name = "  ".into();
        assert_eq!(schedule.validate(), Err(ScheduleError::EmptyName));
    }

    #[test]
    fn test_catch_up_single_due_occurrence() {
        let schedule = monthly_expense(d(2025, 1, 1));
        let result = schedule.catch_up(d(2025, 1, 1), None);
        assert_eq!(result.occurrences, vec![d(2025, 1, 1)]);
        assert_eq!(result.next_run_date, d(2025, 2, 1));
        assert!(result.active);
        assert!(!result.truncated);
    }

    #[test]
    fn test_catch_up_posts_each_missed_period_at_its_own_date() {
        let schedule = monthly_expense(d(2025, 1, 31));
        let result = schedule.catch_up(d(2025, 4, 15), None);
        assert_eq!(
            result.occurrences,
            vec![d(2025, 1, 31), d(2025, 2, 28), d(2025, 3, 28)]
        );
        assert_eq!(result.next_run_date, d(2025, 4, 28));
    }

    #[test]
    fn test_catch_up_nothing_due() {
        let schedule = monthly_expense(d(2025, 2, 1));
        let result = schedule.catch_up(d(2025, 1, 31), None);
        assert!(result.occurrences.is_empty());
        assert!(!result.changes(&schedule));
    }

    #[test]
    fn test_catch_up_already_past_end_deactivates_without_posting() {
        let schedule = monthly_expense(d(2024, 1, 1))
            .with_next_run_date(d(2025, 1, 1))
            .with_end_date(d(2024, 12, 31));
        let result = schedule.catch_up(d(2025, 1, 1), None);
        assert!(result.occurrences.is_empty());
        assert_eq!(result.next_run_date, d(2025, 1, 1));
        assert!(!result.active);
        assert!(result.changes(&schedule));
    }

    #[test]
    fn test_catch_up_past_end_deactivates_even_when_not_due() {
        let schedule = monthly_expense(d(2024, 1, 1))
            .with_next_run_date(d(2025, 3, 1))
            .with_end_date(d(2025, 2, 1));
        let result = schedule.catch_up(d(2025, 1, 1), None);
        assert!(result.occurrences.is_empty());
        assert!(!result.active);
    }

    #[test]
    fn test_catch_up_posts_backlog_within_end_then_deactivates() {
        let schedule = RecurringSchedule::new(
            "Trial",
            999,
            Binding::Expense { category_id: None },
            Frequency::Weekly,
            d(2025, 1, 1),
        )
        .with_end_date(d(2025, 1, 15));

        let result = schedule.catch_up(d(2025, 2, 1), None);
        // Occurrence exactly on the end date still posts.
        assert_eq!(
            result.occurrences,
            vec![d(2025, 1, 1), d(2025, 1, 8), d(2025, 1, 15)]
        );
        assert_eq!(result.next_run_date, d(2025, 1, 22));
        assert!(!result.active);
    }

    #[test]
    fn test_catch_up_respects_backlog_cap() {
        let schedule = RecurringSchedule::new(
            "Coffee",
            350,
            Binding::Expense { category_id: None },
            Frequency::every_n_days(1).unwrap(),
            d(2025, 1, 1),
        );
        let result = schedule.catch_up(d(2025, 1, 10), Some(4));
        assert_eq!(result.occurrences.len(), 4);
        assert_eq!(result.next_run_date, d(2025, 1, 5));
        assert!(result.truncated);
        assert!(result.active);

        let exact = schedule.catch_up(d(2025, 1, 4), Some(4));
        assert_eq!(exact.occurrences.len(), 4);
        assert!(!exact.truncated);
    }

    #[test]
    fn test_catch_up_stops_at_end_of_calendar() {
        let schedule = monthly_expense(d(2025, 1, 1)).with_next_run_date(NaiveDate::MAX);
        let result = schedule.catch_up(NaiveDate::MAX, None);
        assert_eq!(result.occurrences, vec![NaiveDate::MAX]);
        assert_eq!(result.next_run_date, NaiveDate::MAX);
        assert!(!result.active);

        assert_eq!(
            schedule.run_once(),
            RunOnce::Post {
                occurrence: NaiveDate::MAX,
                next_run_date: NaiveDate::MAX,
                active: false,
            }
        );
    }

    #[test]
    fn test_pending_occurrences_skip_manual_and_inactive() {
        let schedule = monthly_expense(d(2025, 1, 1));
        assert_eq!(
            schedule.pending_occurrences(d(2025, 2, 1)),
            vec![d(2025, 1, 1), d(2025, 2, 1)]
        );

        let manual = monthly_expense(d(2025, 1, 1)).with_auto_post(false);
        assert!(manual.pending_occurrences(d(2025, 2, 1)).is_empty());

        let mut paused = monthly_expense(d(2025, 1, 1));
        paused.active = false;
        assert!(paused.pending_occurrences(d(2025, 2, 1)).is_empty());
    }

    #[test]
    fn test_run_once_ignores_due_date() {
        let schedule = monthly_expense(d(2025, 6, 15));
        assert_eq!(
            schedule.run_once(),
            RunOnce::Post {
                occurrence: d(2025, 6, 15),
                next_run_date: d(2025, 7, 15),
                active: true,
            }
        );
    }

    #[test]
    fn test_run_once_respects_end_date() {
        let last = monthly_expense(d(2025, 1, 1)).with_end_date(d(2025, 1, 20));
        assert_eq!(
            last.run_once(),
            RunOnce::Post {
                occurrence: d(2025, 1, 1),
                next_run_date: d(2025, 2, 1),
                active: false,
            }
        );

        let expired = monthly_expense(d(2024, 1, 1))
            .with_next_run_date(d(2025, 1, 1))
            .with_end_date(d(2024, 12, 31));
        assert_eq!(expired.run_once(), RunOnce::Expired);
    }

    #[test]
    fn test_pending_occurrences_inactive_is_empty() {
        let mut schedule = monthly_expense(d(2025, 1, 1));
        assert_eq!(schedule.pending_occurrences(d(2025, 2, 1)).len(), 2);
        schedule.active = false;
        assert!(schedule.pending_occurrences(d(2025, 2, 1)).is_empty());
    }

    #[test]
    fn test_entry_description_marker() {
        assert_eq!(monthly_expense(d(2025, 1, 1)).entry_description(), "[Recurring] Gym");
    }
}
