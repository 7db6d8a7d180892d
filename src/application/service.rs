use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{
    Binding, Budget, Category, CategoryId, Cents, DEFAULT_INCOME_SOURCE, EntryId, EntryKind,
    Frequency, GoalId, GoalProgress, LedgerEntry, MAX_AMOUNT_CENTS, MonthForecast, MonthWindow,
    RecurringSchedule, RunOnce, SavingsGoal, ScheduleId, format_cents, normalize_label,
};
use crate::storage::Repository;

use super::{
    AppError, BudgetStatus, EngineSettings, MonthTotals, MonthlyReport, MonthlySummary,
};

/// Number of expenses listed in the monthly report.
const RECENT_EXPENSES: usize = 5;

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, timer, tests).
pub struct LedgerService {
    repo: Repository,
    settings: EngineSettings,
}

/// Filter for querying entries
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub kind: Option<EntryKind>,
    pub category: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<usize>,
}

/// Definition of a new recurring schedule.
#[derive(Debug, Clone)]
pub struct ScheduleDraft {
    pub name: String,
    pub kind: EntryKind,
    pub amount_cents: Cents,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// First run date; defaults to the start date
    pub next_run_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Expense category name, created if absent
    pub category: Option<String>,
    /// Income source label
    pub source: Option<String>,
    pub auto_post: bool,
    pub notes: Option<String>,
}

impl ScheduleDraft {
    pub fn expense(
        name: impl Into<String>,
        amount_cents: Cents,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self::new(EntryKind::Expense, name.into(), amount_cents, frequency, start_date)
    }

    pub fn income(
        name: impl Into<String>,
        amount_cents: Cents,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self::new(EntryKind::Income, name.into(), amount_cents, frequency, start_date)
    }

    fn new(
        kind: EntryKind,
        name: String,
        amount_cents: Cents,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            name,
            kind,
            amount_cents,
            frequency,
            start_date,
            next_run_date: None,
            end_date: None,
            category: None,
            source: None,
            auto_post: true,
            notes: None,
        }
    }
}

/// Edits to an existing schedule. `None` leaves a field alone.
#[derive(Debug, Clone, Default)]
pub struct ScheduleChanges {
    pub name: Option<String>,
    pub amount_cents: Option<Cents>,
    pub frequency: Option<Frequency>,
    /// `Some(None)` clears the end date
    pub end_date: Option<Option<NaiveDate>>,
    pub auto_post: Option<bool>,
    pub active: Option<bool>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
    /// Expense schedules only
    pub category: Option<String>,
    /// Income schedules only
    pub source: Option<String>,
}

/// Result of a manual run of one schedule.
#[derive(Debug, Clone)]
pub struct RunOnceOutcome {
    pub schedule: RecurringSchedule,
    /// `None` when the schedule had already run past its end date
    pub entry: Option<LedgerEntry>,
}

impl LedgerService {
    /// Create a new ledger service with the given repository and default settings.
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // ========================
    // Category operations
    // ========================

    pub async fn get_or_create_category(&self, name: &str) -> Result<Category, AppError> {
        let name = normalize_label(Some(name)).ok_or(AppError::EmptyCategoryName)?;
        Ok(self.repo.get_or_create_category(&name).await?)
    }

    pub async fn get_category(&self, name: &str) -> Result<Category, AppError> {
        self.repo
            .get_category_by_name(name)
            .await?
            .ok_or_else(|| AppError::CategoryNotFound(name.to_string()))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        Ok(self.repo.list_categories().await?)
    }

    async fn default_category(&self) -> Result<Category, AppError> {
        self.get_or_create_category(&self.settings.default_expense_category)
            .await
    }

    /// Resolve an optional category name; blank means the default category.
    async fn category_or_default(&self, name: Option<&str>) -> Result<Category, AppError> {
        match normalize_label(name) {
            Some(name) => self.get_or_create_category(&name).await,
            None => self.default_category().await,
        }
    }

    // ========================
    // Ledger entry operations
    // ========================

    /// Record a one-off expense. A missing category files it under the default category.
    pub async fn add_expense(
        &self,
        date: NaiveDate,
        amount_cents: Cents,
        category: Option<&str>,
        description: Option<String>,
    ) -> Result<LedgerEntry, AppError> {
        ensure_valid_amount(amount_cents)?;
        let category = self.category_or_default(category).await?;

        let mut entry = LedgerEntry::expense(date, amount_cents, category.id);
        if let Some(description) = description {
            entry = entry.with_description(description);
        }

        self.repo.save_entry(&entry).await?;
        Ok(entry)
    }

    /// Record a one-off income. A blank source is stored as "Other".
    pub async fn add_income(
        &self,
        date: NaiveDate,
        amount_cents: Cents,
        source: Option<&str>,
        description: Option<String>,
    ) -> Result<LedgerEntry, AppError> {
        ensure_valid_amount(amount_cents)?;

        let mut entry = LedgerEntry::income(date, amount_cents, source);
        if let Some(description) = description {
            entry = entry.with_description(description);
        }

        self.repo.save_entry(&entry).await?;
        Ok(entry)
    }

    pub async fn get_entry(&self, id: EntryId) -> Result<LedgerEntry, AppError> {
        self.repo
            .get_entry(id)
            .await?
            .ok_or(AppError::EntryNotFound(id))
    }

    pub async fn delete_entry(&self, id: EntryId) -> Result<(), AppError> {
        if !self.repo.delete_entry(id).await? {
            return Err(AppError::EntryNotFound(id));
        }
        Ok(())
    }

    pub async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, AppError> {
        let category_id = match filter.category.as_deref() {
            Some(name) => Some(self.get_category(name).await?.id),
            None => None,
        };

        Ok(self
            .repo
            .list_entries(
                filter.kind,
                category_id,
                filter.from_date,
                filter.to_date,
                filter.limit,
            )
            .await?)
    }

    pub async fn list_schedule_entries(
        &self,
        id: ScheduleId,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        Ok(self.repo.list_entries_for_schedule(id).await?)
    }

    // ========================
    // Schedule operations
    // ========================

    /// Validate and store a new recurring schedule.
    pub async fn create_schedule(&self, draft: ScheduleDraft) -> Result<RecurringSchedule, AppError> {
        let binding = match draft.kind {
            EntryKind::Expense => Binding::Expense { category_id: None },
            EntryKind::Income => Binding::Income {
                source: Some(
                    normalize_label(draft.source.as_deref())
                        .unwrap_or_else(|| DEFAULT_INCOME_SOURCE.to_string()),
                ),
            },
        };

        let mut schedule = RecurringSchedule::new(
            draft.name.trim(),
            draft.amount_cents,
            binding,
            draft.frequency,
            draft.start_date,
        )
        .with_auto_post(draft.auto_post);
        if let Some(next_run_date) = draft.next_run_date {
            schedule = schedule.with_next_run_date(next_run_date);
        }
        if let Some(end_date) = draft.end_date {
            schedule = schedule.with_end_date(end_date);
        }
        if let Some(notes) = normalize_label(draft.notes.as_deref()) {
            schedule = schedule.with_notes(notes);
        }
        schedule.validate()?;

        // Blank stays unbound; posting files it under the default category.
        if draft.kind == EntryKind::Expense {
            if let Some(name) = normalize_label(draft.category.as_deref()) {
                let category = self.repo.get_or_create_category(&name).await?;
                schedule.binding = Binding::Expense {
                    category_id: Some(category.id),
                };
            }
        }

        self.repo.save_schedule(&schedule).await?;
        info!(schedule_id = %schedule.id, name = %schedule.name, kind = %schedule.kind(), "created recurring schedule");
        Ok(schedule)
    }

    pub async fn get_schedule(&self, id: ScheduleId) -> Result<RecurringSchedule, AppError> {
        self.repo
            .get_schedule(id)
            .await?
            .ok_or(AppError::ScheduleNotFound(id))
    }

    /// List schedules ordered by next run date.
    pub async fn list_schedules(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<RecurringSchedule>, AppError> {
        Ok(self.repo.list_schedules(include_inactive).await?)
    }

    /// Apply edits to a schedule. The start and next run dates are never touched here.
    pub async fn update_schedule(
        &self,
        id: ScheduleId,
        changes: ScheduleChanges,
    ) -> Result<RecurringSchedule, AppError> {
        let mut schedule = self.get_schedule(id).await?;

        if let Some(name) = changes.name {
            schedule.name = name.trim().to_string();
        }
        if let Some(amount_cents) = changes.amount_cents {
            schedule.amount_cents = amount_cents;
        }
        if let Some(frequency) = changes.frequency {
            schedule.frequency = frequency;
        }
        if let Some(end_date) = changes.end_date {
            schedule.end_date = end_date;
        }
        if let Some(auto_post) = changes.auto_post {
            schedule.auto_post = auto_post;
        }
        if let Some(active) = changes.active {
            schedule.active = active;
        }
        if let Some(notes) = changes.notes {
            schedule.notes = normalize_label(notes.as_deref());
        }
        schedule.validate()?;

        if let Some(category) = changes.category {
            if schedule.kind() != EntryKind::Expense {
                return Err(AppError::BindingMismatch {
                    field: "category",
                    kind: schedule.kind(),
                });
            }
            let category_id = match normalize_label(Some(&category)) {
                Some(name) => Some(self.repo.get_or_create_category(&name).await?.id),
                None => None,
            };
            schedule.binding = Binding::Expense { category_id };
        }
        if let Some(source) = changes.source {
            if schedule.kind() != EntryKind::Income {
                return Err(AppError::BindingMismatch {
                    field: "source",
                    kind: schedule.kind(),
                });
            }
            schedule.binding = Binding::Income {
                source: Some(
                    normalize_label(Some(&source))
                        .unwrap_or_else(|| DEFAULT_INCOME_SOURCE.to_string()),
                ),
            };
        }

        self.store_schedule(schedule).await
    }

    /// Flip a schedule between active and paused.
    pub async fn toggle_schedule(&self, id: ScheduleId) -> Result<RecurringSchedule, AppError> {
        let mut schedule = self.get_schedule(id).await?;
        schedule.active = !schedule.active;
        let schedule = self.store_schedule(schedule).await?;
        info!(schedule_id = %id, active = schedule.active, "toggled recurring schedule");
        Ok(schedule)
    }

    /// Remove a schedule. Entries it already posted are kept.
    pub async fn delete_schedule(&self, id: ScheduleId) -> Result<(), AppError> {
        if !self.repo.delete_schedule(id).await? {
            return Err(AppError::ScheduleNotFound(id));
        }
        info!(schedule_id = %id, "deleted recurring schedule");
        Ok(())
    }

    /// Dates `run_due(today)` would post for this schedule, ignoring the backlog cap.
    pub async fn pending_occurrences(
        &self,
        id: ScheduleId,
        today: NaiveDate,
    ) -> Result<Vec<NaiveDate>, AppError> {
        let schedule = self.get_schedule(id).await?;
        Ok(schedule.pending_occurrences(today))
    }

    async fn store_schedule(
        &self,
        mut schedule: RecurringSchedule,
    ) -> Result<RecurringSchedule, AppError> {
        if !self.repo.update_schedule(&schedule).await? {
            warn!(schedule_id = %schedule.id, "schedule changed underneath an edit");
            return Err(AppError::ScheduleConflict(schedule.id));
        }
        schedule.version += 1;
        Ok(schedule)
    }

    // ========================
    // Posting engine
    // ========================

    /// Post every due occurrence of every active auto-posting schedule up to `today`.
    ///
    /// Missed periods are caught up one entry per period, each dated at its own occurrence.
    /// Schedules whose run date has passed their end date are deactivated. Returns the number of
    /// entries posted; a second call with the same `today` posts nothing.
    pub async fn run_due(&self, today: NaiveDate) -> Result<usize, AppError> {
        let schedules = self.repo.list_due_schedules(today).await?;
        let scanned = schedules.len();
        let mut default_category: Option<CategoryId> = None;
        let mut posted = 0;

        for schedule in schedules {
            let catch_up = schedule.catch_up(today, self.settings.max_catch_up);
            if !catch_up.changes(&schedule) {
                continue;
            }
            if catch_up.truncated {
                warn!(
                    schedule_id = %schedule.id,
                    name = %schedule.name,
                    posted = catch_up.occurrences.len(),
                    next_run_date = %catch_up.next_run_date,
                    "backlog cap reached, remaining occurrences stay due"
                );
            }

            let unbound_expense = matches!(schedule.binding, Binding::Expense { category_id: None });
            let fallback = if unbound_expense && !catch_up.occurrences.is_empty() {
                match default_category {
                    Some(id) => id,
                    None => {
                        let id = self.default_category().await?.id;
                        default_category = Some(id);
                        id
                    }
                }
            } else {
                // only read for unbound expense schedules
                CategoryId::nil()
            };

            let entries: Vec<LedgerEntry> = catch_up
                .occurrences
                .iter()
                .map(|&date| {
                    LedgerEntry::from_occurrence(
                        &schedule,
                        date,
                        fallback,
                        &self.settings.default_income_source,
                    )
                })
                .collect();

            let mut updated = schedule.clone();
            updated.next_run_date = catch_up.next_run_date;
            updated.active = catch_up.active;

            if !self.repo.commit_schedule_run(&updated, &entries).await? {
                warn!(schedule_id = %schedule.id, name = %schedule.name, "schedule changed during due scan, skipped");
                continue;
            }

            for entry in &entries {
                debug!(
                    schedule_id = %schedule.id,
                    entry_id = %entry.id,
                    date = %entry.date,
                    amount_cents = entry.amount_cents,
                    kind = %entry.kind,
                    "posted occurrence"
                );
            }
            if schedule.active && !updated.active {
                info!(schedule_id = %schedule.id, name = %schedule.name, "schedule passed its end date, deactivated");
            }
            posted += entries.len();
        }

        info!(%today, scanned, posted, "due scan finished");
        Ok(posted)
    }

    /// Post the next occurrence of one schedule now, whether or not it is due, active, or
    /// auto-posting. A schedule already past its end date is deactivated without posting.
    pub async fn run_once(&self, id: ScheduleId) -> Result<RunOnceOutcome, AppError> {
        let schedule = self.get_schedule(id).await?;
        let mut updated = schedule.clone();

        let entry = match schedule.run_once() {
            RunOnce::Post {
                occurrence,
                next_run_date,
                active,
            } => {
                let fallback = match schedule.binding {
                    Binding::Expense { category_id: None } => self.default_category().await?.id,
                    _ => CategoryId::nil(),
                };
                updated.next_run_date = next_run_date;
                updated.active = active;
                Some(LedgerEntry::from_occurrence(
                    &schedule,
                    occurrence,
                    fallback,
                    &self.settings.default_income_source,
                ))
            }
            RunOnce::Expired => {
                updated.active = false;
                None
            }
        };

        let entries: Vec<LedgerEntry> = entry.iter().cloned().collect();
        if !self.repo.commit_schedule_run(&updated, &entries).await? {
            warn!(schedule_id = %id, "schedule changed during manual run");
            return Err(AppError::ScheduleConflict(id));
        }
        updated.version += 1;

        match &entry {
            Some(entry) => info!(schedule_id = %id, date = %entry.date, amount_cents = entry.amount_cents, "posted occurrence manually"),
            None => info!(schedule_id = %id, "schedule passed its end date, deactivated"),
        }

        Ok(RunOnceOutcome {
            schedule: updated,
            entry,
        })
    }

    /// Project the month's recurring expense and income. Nothing is written.
    pub async fn predict(&self, year: i32, month: u32) -> Result<MonthForecast, AppError> {
        let window = MonthWindow::new(year, month)?;
        let schedules = self.repo.list_schedules(false).await?;
        Ok(crate::domain::predict(&schedules, window))
    }

    // ========================
    // Budget operations
    // ========================

    /// Set the cap for a month, for one category or (with `None`) for all spending.
    /// Setting it again replaces the amount.
    pub async fn set_budget(
        &self,
        month: &MonthWindow,
        category: Option<&str>,
        amount_cents: Cents,
    ) -> Result<Budget, AppError> {
        ensure_valid_amount(amount_cents)?;
        let category_id = match normalize_label(category) {
            Some(name) => Some(self.get_or_create_category(&name).await?.id),
            None => None,
        };

        let budget = Budget::new(month, category_id, amount_cents);
        Ok(self.repo.upsert_budget(&budget).await?)
    }

    pub async fn list_budgets(&self, month: &MonthWindow) -> Result<Vec<Budget>, AppError> {
        Ok(self.repo.list_budgets(month).await?)
    }

    /// Cap against actual spending for every budget of the month.
    pub async fn budget_statuses(
        &self,
        month: &MonthWindow,
    ) -> Result<Vec<BudgetStatus>, AppError> {
        let mut statuses = Vec::new();
        for budget in self.repo.list_budgets(month).await? {
            let (category, spent) = match budget.category_id {
                Some(category_id) => {
                    let name = self
                        .repo
                        .get_category(category_id)
                        .await?
                        .map(|c| c.name)
                        .unwrap_or_else(|| category_id.to_string());
                    let spent = self
                        .repo
                        .sum_expenses_for_category(category_id, month)
                        .await?;
                    (Some(name), spent)
                }
                None => (None, self.repo.sum_entries(EntryKind::Expense, month).await?),
            };
            let remaining = budget.remaining(spent);
            statuses.push(BudgetStatus {
                budget,
                category,
                spent,
                remaining,
                over_budget: remaining < 0,
            });
        }
        Ok(statuses)
    }

    // ========================
    // Savings goal operations
    // ========================

    /// Store a new goal. It replaces whatever goal was active before.
    pub async fn create_savings_goal(
        &self,
        name: &str,
        target_cents: Cents,
    ) -> Result<SavingsGoal, AppError> {
        ensure_valid_amount(target_cents)?;
        let name = normalize_label(Some(name)).unwrap_or_else(|| "Savings goal".to_string());
        let goal = SavingsGoal::new(name, target_cents);
        self.repo.save_goal(&goal).await?;
        Ok(goal)
    }

    pub async fn get_goal(&self, id: GoalId) -> Result<SavingsGoal, AppError> {
        self.repo.get_goal(id).await?.ok_or(AppError::GoalNotFound(id))
    }

    pub async fn active_goal(&self) -> Result<Option<SavingsGoal>, AppError> {
        Ok(self.repo.active_goal().await?)
    }

    /// Progress of the month's net flow towards the active goal.
    pub async fn goal_progress(&self, year: i32, month: u32) -> Result<GoalProgress, AppError> {
        let summary = self.monthly_summary(year, month).await?;
        let goal = self.repo.active_goal().await?;
        Ok(GoalProgress::compute(goal.as_ref(), summary.net_flow))
    }

    // ========================
    // Reports
    // ========================

    /// Posted expense by category plus income and net flow for one month.
    pub async fn monthly_summary(&self, year: i32, month: u32) -> Result<MonthlySummary, AppError> {
        let window = MonthWindow::new(year, month)?;
        let by_category = self.repo.expense_totals_by_category(&window).await?;
        let total_expense = self.repo.sum_entries(EntryKind::Expense, &window).await?;
        let total_income = self.repo.sum_entries(EntryKind::Income, &window).await?;

        Ok(MonthlySummary {
            window,
            by_category,
            total_expense,
            total_income,
            net_flow: total_income - total_expense,
        })
    }

    pub async fn monthly_report(&self, year: i32, month: u32) -> Result<MonthlyReport, AppError> {
        let summary = self.monthly_summary(year, month).await?;
        let window = summary.window;
        let forecast = self.predict(year, month).await?;
        let budgets = self.budget_statuses(&window).await?;
        let goal = GoalProgress::compute(self.repo.active_goal().await?.as_ref(), summary.net_flow);
        let recent_expenses = self
            .repo
            .list_entries(
                Some(EntryKind::Expense),
                None,
                Some(window.start),
                Some(window.end),
                Some(RECENT_EXPENSES),
            )
            .await?;

        Ok(MonthlyReport {
            summary,
            forecast,
            budgets,
            goal,
            recent_expenses,
        })
    }

    /// Totals for `months` months ending with the given one, oldest first.
    pub async fn monthly_trend(
        &self,
        year: i32,
        month: u32,
        months: usize,
    ) -> Result<Vec<MonthTotals>, AppError> {
        let mut window = MonthWindow::new(year, month)?;
        let mut windows = Vec::with_capacity(months);
        for _ in 0..months {
            windows.push(window);
            window = window.previous();
        }
        windows.reverse();

        let mut trend = Vec::with_capacity(windows.len());
        for window in windows {
            let expense = self.repo.sum_entries(EntryKind::Expense, &window).await?;
            let income = self.repo.sum_entries(EntryKind::Income, &window).await?;
            trend.push(MonthTotals {
                month: window.key(),
                expense,
                income,
                net: income - expense,
            });
        }
        Ok(trend)
    }
}

fn ensure_valid_amount(amount_cents: Cents) -> Result<(), AppError> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidAmount(format!(
            "amount must be positive, got {}",
            format_cents(amount_cents)
        )));
    }
    if amount_cents > MAX_AMOUNT_CENTS {
        return Err(AppError::InvalidAmount(format!(
            "amount {} exceeds the maximum of {}",
            format_cents(amount_cents),
            format_cents(MAX_AMOUNT_CENTS)
        )));
    }
    Ok(())
}

/// Today's calendar date in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
