use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CategoryId, Cents, MonthWindow};

pub type BudgetId = Uuid;

/// Spending cap for one month, either for a single category or for all spending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    /// Month key, e.g. "2025-10"
    pub month: String,
    /// `None` caps total spending for the month
    pub category_id: Option<CategoryId>,
    pub amount_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Budget {
    pub fn new(month: &MonthWindow, category_id: Option<CategoryId>, amount_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            month: month.key(),
            category_id,
            amount_cents,
            created_at: Utc::now(),
        }
    }

    pub fn is_overall(&self) -> bool {
        self.category_id.is_none()
    }

    /// Cap minus what was spent; negative once the budget is blown.
    pub fn remaining(&self, spent: Cents) -> Cents {
        self.amount_cents - spent
    }
}
