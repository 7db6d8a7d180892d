use thiserror::Error;

use crate::domain::{
    CalendarError, EntryId, EntryKind, FrequencyError, GoalId, ScheduleError, ScheduleId,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    #[error("Recurring schedule not found: {0}")]
    ScheduleNotFound(ScheduleId),

    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Savings goal not found: {0}")]
    GoalNotFound(GoalId),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(#[from] FrequencyError),

    #[error("Invalid recurring schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("{field} does not apply to {kind} schedules")]
    BindingMismatch {
        field: &'static str,
        kind: EntryKind,
    },

    #[error(transparent)]
    InvalidMonth(#[from] CalendarError),

    #[error("Recurring schedule {0} was modified concurrently, try again")]
    ScheduleConflict(ScheduleId),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
