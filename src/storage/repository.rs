use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::application::CategoryTotal;
use crate::domain::{
    Binding, Budget, Category, CategoryId, Cents, EntryId, EntryKind, Frequency, GoalId,
    LedgerEntry, MonthWindow, RecurringSchedule, SavingsGoal, ScheduleId,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_BUDGETS_GOALS};

const DATE_FORMAT: &str = "%Y-%m-%d";

const ENTRY_COLUMNS: &str =
    "id, kind, date, amount_cents, category_id, source, description, schedule_id, recorded_at";

const SCHEDULE_COLUMNS: &str = "id, name, kind, amount_cents, category_id, source, frequency, frequency_value, start_date, next_run_date, end_date, auto_post, active, notes, version, created_at";

/// Repository for categories, ledger entries, recurring schedules, budgets and goals.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations. Safe to run more than once.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::raw_sql(MIGRATION_002_BUDGETS_GOALS)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Category operations
    // ========================

    pub async fn save_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?, ?, ?)")
            .bind(category.id.to_string())
            .bind(&category.name)
            .bind(category.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save category")?;
        Ok(())
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, created_at FROM categories WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category")?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    /// Look a category up by name. Names compare case-insensitively.
    pub async fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name, created_at FROM categories WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch category by name")?;

        row.as_ref().map(Self::row_to_category).transpose()
    }

    /// Return the category called `name`, creating it first if needed.
    pub async fn get_or_create_category(&self, name: &str) -> Result<Category> {
        if let Some(category) = self.get_category_by_name(name).await? {
            return Ok(category);
        }

        // A concurrent insert of the same name loses quietly and the winner is read back.
        let category = Category::new(name);
        sqlx::query(
            "INSERT INTO categories (id, name, created_at) VALUES (?, ?, ?) ON CONFLICT(name) DO NOTHING",
        )
        .bind(category.id.to_string())
        .bind(&category.name)
        .bind(category.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to create category")?;

        self.get_category_by_name(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Category vanished after insert: {}", name))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list categories")?;

        rows.iter().map(Self::row_to_category).collect()
    }

    fn row_to_category(row: &SqliteRow) -> Result<Category> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Category {
            id: Uuid::parse_str(&id_str).context("Invalid category ID")?,
            name: row.get("name"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Ledger entry operations
    // ========================

    /// Append one entry to the ledger.
    pub async fn save_entry(&self, entry: &LedgerEntry) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        Self::insert_entry(&mut *conn, entry).await
    }

    async fn insert_entry(conn: &mut SqliteConnection, entry: &LedgerEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entries (id, kind, date, amount_cents, category_id, source, description, schedule_id, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.kind.as_str())
        .bind(format_day(entry.date))
        .bind(entry.amount_cents)
        .bind(entry.category_id.map(|id| id.to_string()))
        .bind(&entry.source)
        .bind(&entry.description)
        .bind(entry.schedule_id.map(|id| id.to_string()))
        .bind(entry.recorded_at.to_rfc3339())
        .execute(conn)
        .await
        .context("Failed to save entry")?;
        Ok(())
    }

    pub async fn get_entry(&self, id: EntryId) -> Result<Option<LedgerEntry>> {
        let row = sqlx::query(&format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch entry")?;

        row.as_ref().map(Self::row_to_entry).transpose()
    }

    /// Delete an entry. Returns false if it did not exist.
    pub async fn delete_entry(&self, id: EntryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM entries WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete entry")?;
        Ok(result.rows_affected() > 0)
    }

    /// List entries with optional filters, most recent first.
    pub async fn list_entries(
        &self,
        kind: Option<EntryKind>,
        category_id: Option<CategoryId>,
        from_date: Option<NaiveDate>,
        to_date: Option<NaiveDate>,
        limit: Option<usize>,
    ) -> Result<Vec<LedgerEntry>> {
        let mut query = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE 1=1");

        let category_id_str = category_id.map(|id| id.to_string());
        let from_date_str = from_date.map(format_day);
        let to_date_str = to_date.map(format_day);

        if kind.is_some() {
            query.push_str(" AND kind = ?");
        }
        if category_id.is_some() {
            query.push_str(" AND category_id = ?");
        }
        if from_date.is_some() {
            query.push_str(" AND date >= ?");
        }
        if to_date.is_some() {
            query.push_str(" AND date <= ?");
        }

        query.push_str(" ORDER BY date DESC, recorded_at DESC");

        if let Some(lim) = limit {
            query.push_str(&format!(" LIMIT {}", lim));
        }

        let mut sql_query = sqlx::query(&query);

        if let Some(kind) = kind {
            sql_query = sql_query.bind(kind.as_str());
        }
        if let Some(ref cid) = category_id_str {
            sql_query = sql_query.bind(cid);
        }
        if let Some(ref fd) = from_date_str {
            sql_query = sql_query.bind(fd);
        }
        if let Some(ref td) = to_date_str {
            sql_query = sql_query.bind(td);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Entries posted from one schedule, oldest first.
    pub async fn list_entries_for_schedule(&self, schedule_id: ScheduleId) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE schedule_id = ? ORDER BY date, recorded_at"
        ))
        .bind(schedule_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list entries for schedule")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Total of one kind of entry inside the month window.
    pub async fn sum_entries(&self, kind: EntryKind, window: &MonthWindow) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) as total
            FROM entries
            WHERE kind = ? AND date >= ? AND date <= ?
            "#,
        )
        .bind(kind.as_str())
        .bind(format_day(window.start))
        .bind(format_day(window.end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum entries")?;

        Ok(row.get("total"))
    }

    /// Expense total for one category inside the month window.
    pub async fn sum_expenses_for_category(
        &self,
        category_id: CategoryId,
        window: &MonthWindow,
    ) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount_cents), 0) as total
            FROM entries
            WHERE kind = 'expense' AND category_id = ? AND date >= ? AND date <= ?
            "#,
        )
        .bind(category_id.to_string())
        .bind(format_day(window.start))
        .bind(format_day(window.end))
        .fetch_one(&self.pool)
        .await
        .context("Failed to sum expenses for category")?;

        Ok(row.get("total"))
    }

    /// Expense totals grouped by category, largest first.
    pub async fn expense_totals_by_category(&self, window: &MonthWindow) -> Result<Vec<CategoryTotal>> {
        let rows = sqlx::query(
            r#"
            SELECT
                e.category_id as category_id,
                COALESCE(c.name, 'Uncategorized') as category,
                COUNT(*) as count,
                SUM(e.amount_cents) as total
            FROM entries e
            LEFT JOIN categories c ON c.id = e.category_id
            WHERE e.kind = 'expense' AND e.date >= ? AND e.date <= ?
            GROUP BY e.category_id, c.name
            ORDER BY total DESC, category
            "#,
        )
        .bind(format_day(window.start))
        .bind(format_day(window.end))
        .fetch_all(&self.pool)
        .await
        .context("Failed to aggregate expenses by category")?;

        rows.iter()
            .map(|row| -> Result<CategoryTotal> {
                let category_id: Option<String> = row.get("category_id");
                Ok(CategoryTotal {
                    category_id: category_id
                        .map(|s| Uuid::parse_str(&s))
                        .transpose()
                        .context("Invalid category ID")?,
                    category: row.get("category"),
                    count: row.get("count"),
                    total: row.get("total"),
                })
            })
            .collect()
    }

    fn row_to_entry(row: &SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let date_str: String = row.get("date");
        let category_id_str: Option<String> = row.get("category_id");
        let schedule_id_str: Option<String> = row.get("schedule_id");
        let recorded_at_str: String = row.get("recorded_at");

        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            kind: EntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry kind: {}", kind_str))?,
            date: parse_day(&date_str)?,
            amount_cents: row.get("amount_cents"),
            category_id: category_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid category ID")?,
            source: row.get("source"),
            description: row.get("description"),
            schedule_id: schedule_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid schedule ID")?,
            recorded_at: parse_timestamp(&recorded_at_str)?,
        })
    }

    // ========================
    // Schedule operations
    // ========================

    pub async fn save_schedule(&self, schedule: &RecurringSchedule) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO schedules (id, name, kind, amount_cents, category_id, source, frequency, frequency_value, start_date, next_run_date, end_date, auto_post, active, notes, version, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(schedule.id.to_string())
        .bind(&schedule.name)
        .bind(schedule.kind().as_str())
        .bind(schedule.amount_cents)
        .bind(schedule.binding.category_id().map(|id| id.to_string()))
        .bind(schedule.binding.source())
        .bind(schedule.frequency.as_str())
        .bind(schedule.frequency.parameter().map(i64::from))
        .bind(format_day(schedule.start_date))
        .bind(format_day(schedule.next_run_date))
        .bind(schedule.end_date.map(format_day))
        .bind(schedule.auto_post)
        .bind(schedule.active)
        .bind(&schedule.notes)
        .bind(schedule.version)
        .bind(schedule.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save schedule")?;
        Ok(())
    }

    pub async fn get_schedule(&self, id: ScheduleId) -> Result<Option<RecurringSchedule>> {
        let row = sqlx::query(&format!("SELECT {SCHEDULE_COLUMNS} FROM schedules WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch schedule")?;

        row.as_ref().map(Self::row_to_schedule).transpose()
    }

    /// List schedules ordered by next run date.
    pub async fn list_schedules(&self, include_inactive: bool) -> Result<Vec<RecurringSchedule>> {
        let filter = if include_inactive { "" } else { "WHERE active = 1" };
        let rows = sqlx::query(&format!(
            "SELECT {SCHEDULE_COLUMNS} FROM schedules {filter} ORDER BY next_run_date, name"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list schedules")?;

        rows.iter().map(Self::row_to_schedule).collect()
    }

    /// Active auto-posting schedules the due scan has work for on `today`: either an occurrence
    /// is due or the run date already lies past the end date.
    pub async fn list_due_schedules(&self, today: NaiveDate) -> Result<Vec<RecurringSchedule>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {SCHEDULE_COLUMNS}
            FROM schedules
            WHERE active = 1 AND auto_post = 1
              AND (next_run_date <= ? OR (end_date IS NOT NULL AND next_run_date > end_date))
            ORDER BY next_run_date, name
            "#
        ))
        .bind(format_day(today))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list due schedules")?;

        rows.iter().map(Self::row_to_schedule).collect()
    }

    /// Write back every mutable column of `schedule`, guarded by its version.
    ///
    /// Returns false when the stored version no longer matches, i.e. someone else wrote first.
    pub async fn update_schedule(&self, schedule: &RecurringSchedule) -> Result<bool> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("Failed to acquire connection")?;
        Self::write_schedule(&mut *conn, schedule).await
    }

    async fn write_schedule(conn: &mut SqliteConnection, schedule: &RecurringSchedule) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE schedules
            SET name = ?, kind = ?, amount_cents = ?, category_id = ?, source = ?,
                frequency = ?, frequency_value = ?, next_run_date = ?, end_date = ?,
                auto_post = ?, active = ?, notes = ?, version = version + 1
            WHERE id = ? AND version = ?
            "#,
        )
        .bind(&schedule.name)
        .bind(schedule.kind().as_str())
        .bind(schedule.amount_cents)
        .bind(schedule.binding.category_id().map(|id| id.to_string()))
        .bind(schedule.binding.source())
        .bind(schedule.frequency.as_str())
        .bind(schedule.frequency.parameter().map(i64::from))
        .bind(format_day(schedule.next_run_date))
        .bind(schedule.end_date.map(format_day))
        .bind(schedule.auto_post)
        .bind(schedule.active)
        .bind(&schedule.notes)
        .bind(schedule.id.to_string())
        .bind(schedule.version)
        .execute(conn)
        .await
        .context("Failed to update schedule")?;

        Ok(result.rows_affected() == 1)
    }

    /// Persist a schedule's new state together with the entries it posted, atomically.
    ///
    /// `schedule.version` must be the version the caller read. Nothing is written and false is
    /// returned when the row changed in the meantime.
    pub async fn commit_schedule_run(
        &self,
        schedule: &RecurringSchedule,
        entries: &[LedgerEntry],
    ) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        if !Self::write_schedule(&mut *tx, schedule).await? {
            tx.rollback()
                .await
                .context("Failed to roll back schedule run")?;
            return Ok(false);
        }

        for entry in entries {
            Self::insert_entry(&mut *tx, entry).await?;
        }

        tx.commit().await.context("Failed to commit schedule run")?;
        Ok(true)
    }

    /// Delete a schedule. Posted entries stay. Returns false if it did not exist.
    pub async fn delete_schedule(&self, id: ScheduleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete schedule")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_schedule(row: &SqliteRow) -> Result<RecurringSchedule> {
        let id_str: String = row.get("id");
        let kind_str: String = row.get("kind");
        let category_id_str: Option<String> = row.get("category_id");
        let frequency_str: String = row.get("frequency");
        let frequency_value: Option<i64> = row.get("frequency_value");
        let start_date_str: String = row.get("start_date");
        let next_run_date_str: String = row.get("next_run_date");
        let end_date_str: Option<String> = row.get("end_date");
        let created_at_str: String = row.get("created_at");

        let kind = EntryKind::from_str(&kind_str)
            .ok_or_else(|| anyhow::anyhow!("Invalid schedule kind: {}", kind_str))?;
        let binding = match kind {
            EntryKind::Expense => Binding::Expense {
                category_id: category_id_str
                    .map(|s| Uuid::parse_str(&s))
                    .transpose()
                    .context("Invalid category ID")?,
            },
            EntryKind::Income => Binding::Income {
                source: row.get("source"),
            },
        };

        Ok(RecurringSchedule {
            id: Uuid::parse_str(&id_str).context("Invalid schedule ID")?,
            name: row.get("name"),
            amount_cents: row.get("amount_cents"),
            binding,
            frequency: Frequency::from_parts(&frequency_str, frequency_value)
                .with_context(|| format!("Invalid stored frequency: {}", frequency_str))?,
            start_date: parse_day(&start_date_str)?,
            next_run_date: parse_day(&next_run_date_str)?,
            end_date: end_date_str.as_deref().map(parse_day).transpose()?,
            auto_post: row.get::<i32, _>("auto_post") != 0,
            active: row.get::<i32, _>("active") != 0,
            notes: row.get("notes"),
            version: row.get("version"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Budget operations
    // ========================

    /// Budget for a month and category; `None` looks up the overall cap.
    pub async fn get_budget(
        &self,
        month: &MonthWindow,
        category_id: Option<CategoryId>,
    ) -> Result<Option<Budget>> {
        self.fetch_budget(&month.key(), category_id).await
    }

    async fn fetch_budget(
        &self,
        month_key: &str,
        category_id: Option<CategoryId>,
    ) -> Result<Option<Budget>> {
        let row = sqlx::query(
            r#"
            SELECT id, month, category_id, amount_cents, created_at
            FROM budgets
            WHERE month = ? AND category_id IS ?
            "#,
        )
        .bind(month_key)
        .bind(category_id.map(|id| id.to_string()))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch budget")?;

        row.as_ref().map(Self::row_to_budget).transpose()
    }

    /// Insert `budget`, or replace the amount of the cap already set for its month and category.
    /// Returns the stored row, which keeps its original id.
    pub async fn upsert_budget(&self, budget: &Budget) -> Result<Budget> {
        sqlx::query(
            r#"
            INSERT INTO budgets (id, month, category_id, amount_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (month, COALESCE(category_id, ''))
            DO UPDATE SET amount_cents = excluded.amount_cents
            "#,
        )
        .bind(budget.id.to_string())
        .bind(&budget.month)
        .bind(budget.category_id.map(|id| id.to_string()))
        .bind(budget.amount_cents)
        .bind(budget.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save budget")?;

        self.fetch_budget(&budget.month, budget.category_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Budget for {} vanished after upsert", budget.month))
    }

    /// Budgets of one month, overall cap first.
    pub async fn list_budgets(&self, month: &MonthWindow) -> Result<Vec<Budget>> {
        let rows = sqlx::query(
            r#"
            SELECT b.id, b.month, b.category_id, b.amount_cents, b.created_at
            FROM budgets b
            LEFT JOIN categories c ON c.id = b.category_id
            WHERE b.month = ?
            ORDER BY b.category_id IS NOT NULL, c.name
            "#,
        )
        .bind(month.key())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list budgets")?;

        rows.iter().map(Self::row_to_budget).collect()
    }

    fn row_to_budget(row: &SqliteRow) -> Result<Budget> {
        let id_str: String = row.get("id");
        let category_id_str: Option<String> = row.get("category_id");
        let created_at_str: String = row.get("created_at");

        Ok(Budget {
            id: Uuid::parse_str(&id_str).context("Invalid budget ID")?,
            month: row.get("month"),
            category_id: category_id_str
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .context("Invalid category ID")?,
            amount_cents: row.get("amount_cents"),
            created_at: parse_timestamp(&created_at_str)?,
        })
    }

    // ========================
    // Savings goal operations
    // ========================

    /// Store `goal` as the only active goal.
    pub async fn save_goal(&self, goal: &SavingsGoal) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query("UPDATE savings_goals SET active = 0 WHERE active = 1")
            .execute(&mut *tx)
            .await
            .context("Failed to deactivate previous goals")?;

        sqlx::query(
            r#"
            INSERT INTO savings_goals (id, name, target_cents, created_on, active)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(goal.id.to_string())
        .bind(&goal.name)
        .bind(goal.target_cents)
        .bind(format_day(goal.created_on))
        .bind(goal.active)
        .execute(&mut *tx)
        .await
        .context("Failed to save goal")?;

        tx.commit().await.context("Failed to commit goal")?;
        Ok(())
    }

    pub async fn get_goal(&self, id: GoalId) -> Result<Option<SavingsGoal>> {
        let row = sqlx::query(
            "SELECT id, name, target_cents, created_on, active FROM savings_goals WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch goal")?;

        row.as_ref().map(Self::row_to_goal).transpose()
    }

    pub async fn active_goal(&self) -> Result<Option<SavingsGoal>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, target_cents, created_on, active
            FROM savings_goals
            WHERE active = 1
            ORDER BY created_on DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch active goal")?;

        row.as_ref().map(Self::row_to_goal).transpose()
    }

    fn row_to_goal(row: &SqliteRow) -> Result<SavingsGoal> {
        let id_str: String = row.get("id");
        let created_on_str: String = row.get("created_on");

        Ok(SavingsGoal {
            id: Uuid::parse_str(&id_str).context("Invalid goal ID")?,
            name: row.get("name"),
            target_cents: row.get("target_cents"),
            created_on: parse_day(&created_on_str)?,
            active: row.get::<i32, _>("active") != 0,
        })
    }
}

fn format_day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("Invalid date: {}", s))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}
