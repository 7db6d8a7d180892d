use serde::{Deserialize, Serialize};

use crate::domain::{
    Budget, CategoryId, Cents, GoalProgress, LedgerEntry, MonthForecast, MonthWindow,
};

/// Expense total of one category within a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_id: Option<CategoryId>,
    pub category: String,
    pub count: i64,
    pub total: Cents,
}

/// Posted totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub window: MonthWindow,
    /// Largest first
    pub by_category: Vec<CategoryTotal>,
    pub total_expense: Cents,
    pub total_income: Cents,
    pub net_flow: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub budget: Budget,
    /// `None` for the overall cap
    pub category: Option<String>,
    pub spent: Cents,
    pub remaining: Cents,
    pub over_budget: bool,
}

/// Everything the monthly dashboard shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub summary: MonthlySummary,
    pub forecast: MonthForecast,
    pub budgets: Vec<BudgetStatus>,
    pub goal: GoalProgress,
    pub recent_expenses: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTotals {
    pub month: String,
    pub expense: Cents,
    pub income: Cents,
    pub net: Cents,
}
