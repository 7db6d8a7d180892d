use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::{
    Config, EntryFilter, LedgerService, ScheduleChanges, ScheduleDraft, today,
};
use crate::domain::{
    CategoryId, EntryKind, Frequency, LedgerEntry, MonthWindow, RecurringSchedule, format_cents,
    parse_cents,
};

/// Recurra - Personal Finance Ledger with recurring entries
#[derive(Parser)]
#[command(name = "recurra")]
#[command(about = "A local-first personal finance ledger that posts and forecasts recurring bills and income")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "RECURRA_DATABASE", default_value = "recurra.db")]
    pub database: String,

    /// JSON settings file
    #[arg(long, env = "RECURRA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Do not post due recurring entries before running the command
    #[arg(long, global = true)]
    pub no_auto_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Category management commands
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Record and list one-off expenses
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// Record and list one-off income
    #[command(subcommand)]
    Income(IncomeCommands),

    /// Recurring bill, subscription and paycheck management
    #[command(subcommand)]
    Recurring(RecurringCommands),

    /// Forecast a month's recurring expense and income
    Forecast {
        /// Month to forecast (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Generate reports
    #[command(subcommand)]
    Report(ReportCommands),

    /// Monthly budget commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Savings goal commands
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Keep posting due recurring entries on a timer until interrupted
    Watch {
        /// Seconds between due scans (defaults to the configured interval)
        #[arg(short, long)]
        interval: Option<u64>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a category (no-op if it exists)
    Add {
        /// Category name
        name: String,
    },

    /// List all categories
    List,
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense
    Add {
        /// Amount (e.g., "12.50" or "12")
        amount: String,

        /// Category name (created if missing)
        #[arg(short, long)]
        category: Option<String>,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List expenses
    List {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete an entry
    Delete {
        /// Entry ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum IncomeCommands {
    /// Record income
    Add {
        /// Amount (e.g., "2500.00")
        amount: String,

        /// Where the money came from (defaults to "Other")
        #[arg(short, long)]
        source: Option<String>,

        /// Date of the income (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List income
    List {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[derive(Subcommand)]
pub enum RecurringCommands {
    /// Create a recurring schedule
    Add {
        /// Schedule name
        name: String,

        /// Amount per occurrence (e.g., "49.99")
        #[arg(short, long)]
        amount: String,

        /// Kind: expense, income
        #[arg(short, long, default_value = "expense")]
        kind: String,

        /// Frequency: weekly, biweekly, monthly, every:N (days), day:D (day of month, 1-28)
        #[arg(short, long)]
        frequency: String,

        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,

        /// First run date if later than the start date (YYYY-MM-DD)
        #[arg(long)]
        first_run: Option<String>,

        /// Last date an occurrence may fall on (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Expense category (created if missing)
        #[arg(short, long)]
        category: Option<String>,

        /// Income source label
        #[arg(short, long)]
        source: Option<String>,

        /// Only post when run manually
        #[arg(long)]
        manual: bool,

        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List recurring schedules
    List {
        /// Include inactive schedules
        #[arg(long)]
        all: bool,
    },

    /// Show detailed information about a schedule
    Show {
        /// Schedule ID
        id: String,
    },

    /// Edit a schedule
    Edit {
        /// Schedule ID
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New amount
        #[arg(short, long)]
        amount: Option<String>,

        /// New frequency
        #[arg(short, long)]
        frequency: Option<String>,

        /// New end date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_end")]
        end: Option<String>,

        /// Remove the end date
        #[arg(long)]
        clear_end: bool,

        /// Post automatically (true/false)
        #[arg(long)]
        auto_post: Option<bool>,

        /// New expense category
        #[arg(short, long)]
        category: Option<String>,

        /// New income source
        #[arg(short, long)]
        source: Option<String>,

        /// New notes (empty string clears them)
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Pause or resume a schedule
    Toggle {
        /// Schedule ID
        id: String,
    },

    /// Post the next occurrence now, whether or not it is due
    Run {
        /// Schedule ID
        id: String,
    },

    /// Show the occurrences that are due but not yet posted
    Pending {
        /// Schedule ID
        id: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a schedule (posted entries are kept)
    Delete {
        /// Schedule ID
        id: String,
    },

    /// Post all due occurrences
    Due {
        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Spending by category, income and net flow for a month
    Summary {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Summary, forecast, budgets, savings goal and recent expenses
    Full {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Income and expense over the trailing months
    Trend {
        /// Last month of the window (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Number of months
        #[arg(short = 'n', long, default_value = "6")]
        months: usize,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Set the cap for a month
    Set {
        /// Budget amount (e.g., "400" or "400.00")
        amount: String,

        /// Category to cap (omit for total spending)
        #[arg(short, long)]
        category: Option<String>,

        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show budgets with spending for a month
    List {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Set the active savings goal
    Set {
        /// Target amount to save per month
        target: String,

        /// Goal name
        #[arg(short, long, default_value = "Savings goal")]
        name: String,
    },

    /// Show progress towards the active goal
    Show {
        /// Month (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

impl Cli {
    async fn auto_run_due(&self, service: &LedgerService) {
        match service.run_due(today()).await {
            Ok(0) => {}
            Ok(posted) => {
                if self.verbose {
                    eprintln!("[Auto-run] Posted {} recurring entr(y/ies)", posted);
                }
            }
            Err(e) => warn!(error = %e, "automatic due scan failed"),
        }
    }

    pub async fn run(self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;

        if matches!(self.command, Commands::Init) {
            LedgerService::init(&self.database).await?;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = LedgerService::connect(&self.database)
            .await?
            .with_settings(config.engine_settings());

        // Post due recurring entries before command dispatch (the watcher does its own)
        if config.auto_run_due && !self.no_auto_run && !matches!(self.command, Commands::Watch { .. }) {
            self.auto_run_due(&service).await;
        }

        match self.command {
            Commands::Init => {}

            Commands::Category(cmd) => run_category_command(&service, cmd).await?,

            Commands::Expense(cmd) => run_expense_command(&service, cmd).await?,

            Commands::Income(cmd) => run_income_command(&service, cmd).await?,

            Commands::Recurring(cmd) => run_recurring_command(&service, cmd).await?,

            Commands::Forecast { month, format } => {
                let window = parse_month(month.as_deref())?;
                run_forecast_command(&service, &window, &format).await?;
            }

            Commands::Report(cmd) => run_report_command(&service, cmd).await?,

            Commands::Budget(cmd) => run_budget_command(&service, cmd).await?,

            Commands::Goal(cmd) => run_goal_command(&service, cmd).await?,

            Commands::Watch { interval } => {
                let secs = interval.unwrap_or(config.watch_interval_secs).max(1);
                run_watch(&service, Duration::from_secs(secs)).await?;
            }
        }

        Ok(())
    }
}

async fn run_category_command(service: &LedgerService, cmd: CategoryCommands) -> Result<()> {
    match cmd {
        CategoryCommands::Add { name } => {
            let category = service.get_or_create_category(&name).await?;
            println!("Category: {} ({})", category.name, category.id);
        }

        CategoryCommands::List => {
            let categories = service.list_categories().await?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                for category in categories {
                    println!("{}", category.name);
                }
            }
        }
    }

    Ok(())
}

async fn run_expense_command(service: &LedgerService, cmd: ExpenseCommands) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            amount,
            category,
            date,
            description,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '12.50' or '12'")?;
            let date = parse_date_or_today(date.as_deref())?;

            let entry = service
                .add_expense(date, amount_cents, category.as_deref(), description)
                .await?;
            println!(
                "Recorded expense: {} on {} ({})",
                format_cents(entry.amount_cents),
                entry.date,
                entry.id
            );
        }

        ExpenseCommands::List {
            month,
            category,
            limit,
        } => {
            let window = parse_month(month.as_deref())?;
            let filter = EntryFilter {
                kind: Some(EntryKind::Expense),
                category,
                from_date: Some(window.start),
                to_date: Some(window.end),
                limit,
            };
            let entries = service.list_entries(&filter).await?;
            let names = category_names(service).await?;
            print_entries(&entries, &names);
        }

        ExpenseCommands::Delete { id } => {
            let entry_id = parse_id(&id, "entry")?;
            service.delete_entry(entry_id).await?;
            println!("Deleted entry: {}", entry_id);
        }
    }

    Ok(())
}

async fn run_income_command(service: &LedgerService, cmd: IncomeCommands) -> Result<()> {
    match cmd {
        IncomeCommands::Add {
            amount,
            source,
            date,
            description,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '2500.00' or '2500'")?;
            let date = parse_date_or_today(date.as_deref())?;

            let entry = service
                .add_income(date, amount_cents, source.as_deref(), description)
                .await?;
            println!(
                "Recorded income: {} from {} on {} ({})",
                format_cents(entry.amount_cents),
                entry.source.as_deref().unwrap_or("-"),
                entry.date,
                entry.id
            );
        }

        IncomeCommands::List { month, limit } => {
            let window = parse_month(month.as_deref())?;
            let filter = EntryFilter {
                kind: Some(EntryKind::Income),
                from_date: Some(window.start),
                to_date: Some(window.end),
                limit,
                ..Default::default()
            };
            let entries = service.list_entries(&filter).await?;
            print_entries(&entries, &HashMap::new());
        }
    }

    Ok(())
}

async fn run_recurring_command(service: &LedgerService, cmd: RecurringCommands) -> Result<()> {
    match cmd {
        RecurringCommands::Add {
            name,
            amount,
            kind,
            frequency,
            start,
            first_run,
            end,
            category,
            source,
            manual,
            notes,
        } => {
            let amount_cents = parse_cents(&amount)?;
            let kind = EntryKind::from_str(&kind)
                .ok_or_else(|| anyhow::anyhow!("Invalid kind '{}'. Use expense or income", kind))?;
            let frequency: Frequency = frequency.parse()?;
            let start_date = parse_date_or_today(start.as_deref())?;

            let mut draft = match kind {
                EntryKind::Expense => ScheduleDraft::expense(name, amount_cents, frequency, start_date),
                EntryKind::Income => ScheduleDraft::income(name, amount_cents, frequency, start_date),
            };
            draft.next_run_date = first_run.as_deref().map(parse_date).transpose()?;
            draft.end_date = end.as_deref().map(parse_date).transpose()?;
            draft.category = category;
            draft.source = source;
            draft.auto_post = !manual;
            draft.notes = notes;

            let schedule = service.create_schedule(draft).await?;
            println!("Created recurring {}: {}", schedule.kind(), schedule.name);
            println!("  ID: {}", schedule.id);
            println!("  Amount: {}", format_cents(schedule.amount_cents));
            println!("  Frequency: {}", schedule.frequency);
            println!("  Next run: {}", schedule.next_run_date);
            if let Some(end_date) = schedule.end_date {
                println!("  End: {}", end_date);
            }
        }

        RecurringCommands::List { all } => {
            let schedules = service.list_schedules(all).await?;
            if schedules.is_empty() {
                println!("No recurring schedules found.");
            } else {
                println!(
                    "{:<36} {:<20} {:<8} {:>12} {:<14} {:<12} {:<8}",
                    "ID", "NAME", "KIND", "AMOUNT", "FREQUENCY", "NEXT RUN", "STATUS"
                );
                println!("{}", "-".repeat(116));
                for schedule in schedules {
                    println!(
                        "{:<36} {:<20} {:<8} {:>12} {:<14} {:<12} {:<8}",
                        schedule.id,
                        truncate(&schedule.name, 20),
                        schedule.kind(),
                        format_cents(schedule.amount_cents),
                        schedule.frequency.to_string(),
                        schedule.next_run_date.to_string(),
                        status_label(&schedule),
                    );
                }
            }
        }

        RecurringCommands::Show { id } => {
            let schedule_id = parse_id(&id, "schedule")?;
            let schedule = service.get_schedule(schedule_id).await?;
            let pending = service.pending_occurrences(schedule_id, today()).await?;
            let posted = service.list_schedule_entries(schedule_id).await?;
            print_schedule(service, &schedule).await?;
            println!("  Pending: {}", pending.len());
            println!("  Posted entries: {}", posted.len());
            if let Some(last) = posted.last() {
                println!("  Last posted: {} ({})", last.date, format_cents(last.amount_cents));
            }
        }

        RecurringCommands::Edit {
            id,
            name,
            amount,
            frequency,
            end,
            clear_end,
            auto_post,
            category,
            source,
            notes,
        } => {
            let schedule_id = parse_id(&id, "schedule")?;
            let end_date = if clear_end {
                Some(None)
            } else {
                end.as_deref().map(parse_date).transpose()?.map(Some)
            };

            let changes = ScheduleChanges {
                name,
                amount_cents: amount.as_deref().map(parse_cents).transpose()?,
                frequency: frequency
                    .as_deref()
                    .map(str::parse::<Frequency>)
                    .transpose()?,
                end_date,
                auto_post,
                active: None,
                notes: notes.map(|n| Some(n).filter(|n| !n.trim().is_empty())),
                category,
                source,
            };

            let schedule = service.update_schedule(schedule_id, changes).await?;
            println!("Updated recurring schedule: {}", schedule.name);
        }

        RecurringCommands::Toggle { id } => {
            let schedule = service.toggle_schedule(parse_id(&id, "schedule")?).await?;
            println!(
                "{} recurring schedule: {}",
                if schedule.active { "Resumed" } else { "Paused" },
                schedule.name
            );
        }

        RecurringCommands::Run { id } => {
            let outcome = service.run_once(parse_id(&id, "schedule")?).await?;
            match &outcome.entry {
                Some(entry) => println!(
                    "Posted {} for {} on {} (next run: {})",
                    format_cents(entry.amount_cents),
                    outcome.schedule.name,
                    entry.date,
                    outcome.schedule.next_run_date
                ),
                None => println!(
                    "Schedule {} is past its end date; nothing posted and it is now inactive",
                    outcome.schedule.name
                ),
            }
            if outcome.entry.is_some() && !outcome.schedule.active {
                println!("Schedule reached its end date and is now inactive");
            }
        }

        RecurringCommands::Pending { id, date } => {
            let schedule_id = parse_id(&id, "schedule")?;
            let date = parse_date_or_today(date.as_deref())?;
            let pending = service.pending_occurrences(schedule_id, date).await?;
            if pending.is_empty() {
                println!("Nothing due as of {}.", date);
            } else {
                for occurrence in pending {
                    println!("{}", occurrence);
                }
            }
        }

        RecurringCommands::Delete { id } => {
            let schedule_id = parse_id(&id, "schedule")?;
            service.delete_schedule(schedule_id).await?;
            println!("Deleted recurring schedule: {}", schedule_id);
        }

        RecurringCommands::Due { date } => {
            let date = parse_date_or_today(date.as_deref())?;
            let posted = service.run_due(date).await?;
            println!("Posted {} recurring entr(y/ies) due by {}", posted, date);
        }
    }

    Ok(())
}

async fn run_forecast_command(
    service: &LedgerService,
    window: &MonthWindow,
    format: &str,
) -> Result<()> {
    let forecast = service.predict(window.year, window.month).await?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&forecast)?),
        _ => {
            println!("Forecast for {}", forecast.window);
            println!();
            if !forecast.schedules.is_empty() {
                println!("{:<24} {:<8} {:>6} {:>12}", "SCHEDULE", "KIND", "COUNT", "TOTAL");
                println!("{}", "-".repeat(53));
                for projection in &forecast.schedules {
                    println!(
                        "{:<24} {:<8} {:>6} {:>12}",
                        truncate(&projection.name, 24),
                        projection.kind,
                        projection.occurrences,
                        format_cents(projection.total_cents)
                    );
                }
                println!();
            }
            println!("Predicted expense: {:>12}", format_cents(forecast.predicted_expense));
            println!("Predicted income:  {:>12}", format_cents(forecast.predicted_income));
            println!("Predicted net:     {:>12}", format_cents(forecast.predicted_net()));
        }
    }

    Ok(())
}

async fn run_report_command(service: &LedgerService, cmd: ReportCommands) -> Result<()> {
    match cmd {
        ReportCommands::Summary { month, format } => {
            let window = parse_month(month.as_deref())?;
            let summary = service.monthly_summary(window.year, window.month).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                _ => {
                    println!("Summary for {}", summary.window);
                    println!();
                    println!("{:<24} {:>6} {:>12}", "CATEGORY", "COUNT", "TOTAL");
                    println!("{}", "-".repeat(44));
                    for row in &summary.by_category {
                        println!(
                            "{:<24} {:>6} {:>12}",
                            truncate(&row.category, 24),
                            row.count,
                            format_cents(row.total)
                        );
                    }
                    println!();
                    println!("Total expense: {:>12}", format_cents(summary.total_expense));
                    println!("Total income:  {:>12}", format_cents(summary.total_income));
                    println!("Net flow:      {:>12}", format_cents(summary.net_flow));
                }
            }
        }

        ReportCommands::Full { month, format } => {
            let window = parse_month(month.as_deref())?;
            let report = service.monthly_report(window.year, window.month).await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                _ => {
                    let summary = &report.summary;
                    println!("Report for {}", summary.window);
                    println!();
                    println!(
                        "{:<12} {:>12} {:>12}",
                        "", "ACTUAL", "FORECAST"
                    );
                    println!(
                        "{:<12} {:>12} {:>12}",
                        "Expense",
                        format_cents(summary.total_expense),
                        format_cents(report.forecast.predicted_expense)
                    );
                    println!(
                        "{:<12} {:>12} {:>12}",
                        "Income",
                        format_cents(summary.total_income),
                        format_cents(report.forecast.predicted_income)
                    );
                    println!(
                        "{:<12} {:>12} {:>12}",
                        "Net",
                        format_cents(summary.net_flow),
                        format_cents(report.forecast.predicted_net())
                    );

                    if !report.budgets.is_empty() {
                        println!();
                        println!(
                            "{:<20} {:>12} {:>12} {:>12}",
                            "BUDGET", "LIMIT", "SPENT", "REMAINING"
                        );
                        println!("{}", "-".repeat(59));
                        for status in &report.budgets {
                            println!(
                                "{:<20} {:>12} {:>12} {:>12}{}",
                                truncate(status.category.as_deref().unwrap_or("(overall)"), 20),
                                format_cents(status.budget.amount_cents),
                                format_cents(status.spent),
                                format_cents(status.remaining),
                                if status.over_budget { "  OVER" } else { "" }
                            );
                        }
                    }

                    if let Some(goal) = &report.goal.goal {
                        println!();
                        println!(
                            "Goal '{}': {} of {} ({:.0}%){}",
                            goal.name,
                            format_cents(report.goal.current_savings),
                            format_cents(report.goal.target),
                            report.goal.percent,
                            if report.goal.reached { " - reached" } else { "" }
                        );
                    }

                    if !report.recent_expenses.is_empty() {
                        println!();
                        println!("Recent expenses:");
                        let names = category_names(service).await?;
                        print_entries(&report.recent_expenses, &names);
                    }
                }
            }
        }

        ReportCommands::Trend {
            month,
            months,
            format,
        } => {
            let window = parse_month(month.as_deref())?;
            let trend = service
                .monthly_trend(window.year, window.month, months)
                .await?;

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&trend)?),
                _ => {
                    println!("{:<10} {:>12} {:>12} {:>12}", "MONTH", "INCOME", "EXPENSE", "NET");
                    println!("{}", "-".repeat(49));
                    for totals in trend {
                        println!(
                            "{:<10} {:>12} {:>12} {:>12}",
                            totals.month,
                            format_cents(totals.income),
                            format_cents(totals.expense),
                            format_cents(totals.net)
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

async fn run_budget_command(service: &LedgerService, cmd: BudgetCommands) -> Result<()> {
    match cmd {
        BudgetCommands::Set {
            amount,
            category,
            month,
        } => {
            let amount_cents =
                parse_cents(&amount).context("Invalid amount format. Use '400.00' or '400'")?;
            let window = parse_month(month.as_deref())?;

            let budget = service
                .set_budget(&window, category.as_deref(), amount_cents)
                .await?;
            println!(
                "Budget for {} ({}): {}",
                budget.month,
                category.as_deref().unwrap_or("overall"),
                format_cents(budget.amount_cents)
            );
        }

        BudgetCommands::List { month } => {
            let window = parse_month(month.as_deref())?;
            let statuses = service.budget_statuses(&window).await?;
            if statuses.is_empty() {
                println!("No budgets for {}.", window);
            } else {
                println!(
                    "{:<20} {:>12} {:>12} {:>12}",
                    "BUDGET", "LIMIT", "SPENT", "REMAINING"
                );
                println!("{}", "-".repeat(59));
                for status in statuses {
                    println!(
                        "{:<20} {:>12} {:>12} {:>12}",
                        truncate(status.category.as_deref().unwrap_or("(overall)"), 20),
                        format_cents(status.budget.amount_cents),
                        format_cents(status.spent),
                        format_cents(status.remaining),
                    );
                }
            }
        }
    }

    Ok(())
}

async fn run_goal_command(service: &LedgerService, cmd: GoalCommands) -> Result<()> {
    match cmd {
        GoalCommands::Set { target, name } => {
            let target_cents = parse_cents(&target)?;
            let goal = service.create_savings_goal(&name, target_cents).await?;
            println!(
                "Savings goal set: {} ({})",
                goal.name,
                format_cents(goal.target_cents)
            );
        }

        GoalCommands::Show { month } => {
            let window = parse_month(month.as_deref())?;
            let progress = service.goal_progress(window.year, window.month).await?;
            match &progress.goal {
                None => println!("No active savings goal."),
                Some(goal) => {
                    println!("Goal: {}", goal.name);
                    println!("  Month:    {}", window);
                    println!("  Target:   {}", format_cents(progress.target));
                    println!("  Saved:    {}", format_cents(progress.current_savings));
                    println!("  Progress: {:.1}%", progress.percent);
                    println!("  Reached:  {}", if progress.reached { "yes" } else { "no" });
                }
            }
        }
    }

    Ok(())
}

async fn run_watch(service: &LedgerService, period: Duration) -> Result<()> {
    let mut ticker = tokio::time::interval(period);
    info!(interval_secs = period.as_secs(), "watching for due recurring entries");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match service.run_due(today()).await {
                    Ok(0) => {}
                    Ok(posted) => println!("Posted {} recurring entr(y/ies)", posted),
                    Err(e) => error!(error = %e, "due scan failed"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                info!("stopping watcher");
                break;
            }
        }
    }

    Ok(())
}

async fn print_schedule(service: &LedgerService, schedule: &RecurringSchedule) -> Result<()> {
    println!("Recurring {}: {}", schedule.kind(), schedule.name);
    println!("  ID: {}", schedule.id);
    println!("  Status: {}", status_label(schedule));
    println!("  Amount: {}", format_cents(schedule.amount_cents));
    println!("  Frequency: {}", schedule.frequency);
    match schedule.kind() {
        EntryKind::Expense => {
            let category = match schedule.binding.category_id() {
                Some(id) => category_names(service)
                    .await?
                    .remove(&id)
                    .unwrap_or_else(|| id.to_string()),
                None => format!("{} (default)", service.settings().default_expense_category),
            };
            println!("  Category: {}", category);
        }
        EntryKind::Income => {
            println!(
                "  Source: {}",
                schedule
                    .binding
                    .source()
                    .unwrap_or(service.settings().default_income_source.as_str())
            );
        }
    }
    println!("  Start: {}", schedule.start_date);
    println!("  Next run: {}", schedule.next_run_date);
    if let Some(end_date) = schedule.end_date {
        println!("  End: {}", end_date);
    }
    println!(
        "  Auto-post: {}",
        if schedule.auto_post { "yes" } else { "no" }
    );
    if let Some(notes) = &schedule.notes {
        println!("  Notes: {}", notes);
    }
    Ok(())
}

fn print_entries(entries: &[LedgerEntry], category_names: &HashMap<CategoryId, String>) {
    if entries.is_empty() {
        println!("No entries found.");
        return;
    }

    println!(
        "{:<36} {:<12} {:>12} {:<16} {:<30}",
        "ID", "DATE", "AMOUNT", "CATEGORY/SOURCE", "DESCRIPTION"
    );
    println!("{}", "-".repeat(110));
    for entry in entries {
        let label = match entry.kind {
            EntryKind::Expense => entry
                .category_id
                .and_then(|id| category_names.get(&id).cloned())
                .unwrap_or_else(|| "-".to_string()),
            EntryKind::Income => entry.source.clone().unwrap_or_else(|| "-".to_string()),
        };
        println!(
            "{:<36} {:<12} {:>12} {:<16} {:<30}",
            entry.id,
            entry.date.to_string(),
            format_cents(entry.amount_cents),
            truncate(&label, 16),
            truncate(entry.description.as_deref().unwrap_or(""), 30)
        );
    }
}

async fn category_names(service: &LedgerService) -> Result<HashMap<CategoryId, String>> {
    Ok(service
        .list_categories()
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn status_label(schedule: &RecurringSchedule) -> &'static str {
    match (schedule.active, schedule.auto_post) {
        (false, _) => "inactive",
        (true, true) => "active",
        (true, false) => "manual",
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_id(id: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("Invalid {} ID format (expected UUID)", what))
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))
}

fn parse_date_or_today(date_str: Option<&str>) -> Result<NaiveDate> {
    match date_str {
        Some(s) => parse_date(s),
        None => Ok(today()),
    }
}

fn parse_month(month: Option<&str>) -> Result<MonthWindow> {
    match month {
        Some(key) => Ok(MonthWindow::parse_key(key)?),
        None => Ok(MonthWindow::containing(today())),
    }
}
