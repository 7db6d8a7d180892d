use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CategoryId = Uuid;

/// Expense schedules without a category post here. Created on first use.
pub const DEFAULT_EXPENSE_CATEGORY: &str = "General";

/// Income entries without a source are labelled with this.
pub const DEFAULT_INCOME_SOURCE: &str = "Other";

/// Label for income posted by a schedule that has no source of its own.
pub const DEFAULT_RECURRING_SOURCE: &str = "Recurring";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into().trim().to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Trim a user-supplied label, returning `None` when nothing is left.
pub fn normalize_label(label: Option<&str>) -> Option<String> {
    label
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
