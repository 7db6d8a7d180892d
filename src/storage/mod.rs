mod repository;

pub use repository::*;

/// Categories, entries and schedules
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Budgets and savings goals
pub const MIGRATION_002_BUDGETS_GOALS: &str = include_str!("migrations/002_budgets_goals.sql");
