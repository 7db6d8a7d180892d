use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_EXPENSE_CATEGORY, DEFAULT_RECURRING_SOURCE};

/// User settings, read from an optional JSON file. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Category for expense schedules that have none of their own
    pub default_expense_category: String,
    /// Source label for income schedules that have none of their own
    pub default_income_source: String,
    /// Per-schedule cap on occurrences posted by one due scan
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_catch_up: Option<usize>,
    /// Run the due scan before each command
    pub auto_run_due: bool,
    pub watch_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_expense_category: DEFAULT_EXPENSE_CATEGORY.into(),
            default_income_source: DEFAULT_RECURRING_SOURCE.into(),
            max_catch_up: None,
            auto_run_due: true,
            watch_interval_secs: 3600,
        }
    }
}

impl Config {
    /// Load the file at `path`, or the defaults when there is none.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            default_expense_category: self.default_expense_category.clone(),
            default_income_source: self.default_income_source.clone(),
            max_catch_up: self.max_catch_up,
        }
    }
}

/// The part of [`Config`] the posting engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub default_expense_category: String,
    pub default_income_source: String,
    pub max_catch_up: Option<usize>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Config::default().engine_settings()
    }
}
