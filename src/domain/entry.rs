use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    Binding, CategoryId, Cents, DEFAULT_INCOME_SOURCE, EntryKind, RecurringSchedule, ScheduleId,
    normalize_label,
};

pub type EntryId = Uuid;

/// A posted expense or income row. Entries are immutable; they can only be deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub kind: EntryKind,
    /// Calendar day the money moved
    pub date: NaiveDate,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    /// Expense category; always `None` for income
    pub category_id: Option<CategoryId>,
    /// Income source label; always `None` for expenses
    pub source: Option<String>,
    pub description: Option<String>,
    /// Schedule this entry was posted from, if any
    pub schedule_id: Option<ScheduleId>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    fn new(kind: EntryKind, date: NaiveDate, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Entry amount must be positive");
        Self {
            id: Uuid::new_v4(),
            kind,
            date,
            amount_cents,
            category_id: None,
            source: None,
            description: None,
            schedule_id: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn expense(date: NaiveDate, amount_cents: Cents, category_id: CategoryId) -> Self {
        let mut entry = Self::new(EntryKind::Expense, date, amount_cents);
        entry.category_id = Some(category_id);
        entry
    }

    /// Blank sources are recorded as "Other".
    pub fn income(date: NaiveDate, amount_cents: Cents, source: Option<&str>) -> Self {
        let mut entry = Self::new(EntryKind::Income, date, amount_cents);
        entry.source =
            Some(normalize_label(source).unwrap_or_else(|| DEFAULT_INCOME_SOURCE.to_string()));
        entry
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = normalize_label(Some(&description));
        self
    }

    /// Build the entry for one occurrence of `schedule`.
    ///
    /// The amount is copied verbatim. Expense schedules without a category are filed under
    /// `default_category`; income schedules without a source are labelled `default_source`.
    pub fn from_occurrence(
        schedule: &RecurringSchedule,
        occurrence: NaiveDate,
        default_category: CategoryId,
        default_source: &str,
    ) -> Self {
        let mut entry = match &schedule.binding {
            Binding::Expense { category_id } => LedgerEntry::expense(
                occurrence,
                schedule.amount_cents,
                category_id.unwrap_or(default_category),
            ),
            Binding::Income { source } => {
                let source = normalize_label(source.as_deref())
                    .unwrap_or_else(|| default_source.to_string());
                LedgerEntry::income(occurrence, schedule.amount_cents, Some(&source))
            }
        }
        .with_description(schedule.entry_description());
        entry.schedule_id = Some(schedule.id);
        entry
    }

    pub fn is_recurring(&self) -> bool {
        self.schedule_id.is_some()
    }
}
