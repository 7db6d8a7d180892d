// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use recurra::Repository;
use recurra::application::{EngineSettings, LedgerService, ScheduleDraft};
use recurra::domain::{Frequency, RecurringSchedule};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    test_service_with(EngineSettings::default()).await
}

pub async fn test_service_with(settings: EngineSettings) -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = LedgerService::init(db_path.to_str().unwrap())
        .await?
        .with_settings(settings);
    Ok((service, temp_dir))
}

/// Second handle on the same database, e.g. to race two writers
pub async fn connect_again(temp_dir: &TempDir) -> Result<LedgerService> {
    let db_path = temp_dir.path().join("test.db");
    Ok(LedgerService::connect(db_path.to_str().unwrap()).await?)
}

/// Raw repository on the same database
pub async fn repository(temp_dir: &TempDir) -> Result<Repository> {
    let db_path = temp_dir.path().join("test.db");
    Repository::connect(&format!("sqlite:{}", db_path.display())).await
}

/// Helper to parse a YYYY-MM-DD string
pub fn date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: commonly used schedules
pub struct StandardSchedules;

impl StandardSchedules {
    /// Monthly rent of 1200.00 filed under "Housing"
    pub async fn rent(service: &LedgerService, start: &str) -> Result<RecurringSchedule> {
        let mut draft = ScheduleDraft::expense("Rent", 120000, Frequency::Monthly, date(start));
        draft.category = Some("Housing".into());
        Ok(service.create_schedule(draft).await?)
    }

    /// Salary of 3000.00 on the 25th
    pub async fn salary(service: &LedgerService, start: &str) -> Result<RecurringSchedule> {
        let mut draft = ScheduleDraft::income(
            "Salary",
            300000,
            Frequency::monthly_on_day(25)?,
            date(start),
        );
        draft.source = Some("Employer".into());
        Ok(service.create_schedule(draft).await?)
    }

    /// Weekly gym fee of 15.00 with no category
    pub async fn gym(service: &LedgerService, start: &str) -> Result<RecurringSchedule> {
        let draft = ScheduleDraft::expense("Gym", 1500, Frequency::Weekly, date(start));
        Ok(service.create_schedule(draft).await?)
    }
}
