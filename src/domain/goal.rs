use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type GoalId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavingsGoal {
    pub id: GoalId,
    pub name: String,
    pub target_cents: Cents,
    pub created_on: NaiveDate,
    pub active: bool,
}

impl SavingsGoal {
    pub fn new(name: impl Into<String>, target_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            target_cents,
            created_on: Utc::now().date_naive(),
            active: true,
        }
    }
}

/// How far a month's net cash flow got towards the active savings goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    pub goal: Option<SavingsGoal>,
    pub target: Cents,
    pub current_savings: Cents,
    /// 0..=100
    pub percent: f64,
    pub reached: bool,
}

impl GoalProgress {
    /// No active goal yields all zeros rather than an error.
    pub fn compute(goal: Option<&SavingsGoal>, net_flow: Cents) -> Self {
        let Some(goal) = goal else {
            return Self {
                goal: None,
                target: 0,
                current_savings: 0,
                percent: 0.0,
                reached: false,
            };
        };

        let target = goal.target_cents;
        let percent = if target > 0 {
            (net_flow as f64 / target as f64 * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            goal: Some(goal.clone()),
            target,
            current_savings: net_flow,
            percent,
            reached: net_flow >= target,
        }
    }
}
