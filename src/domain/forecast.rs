use serde::{Deserialize, Serialize};

use super::{Cents, EntryKind, MonthWindow, RecurringSchedule, ScheduleId};

/// Projected postings of one schedule inside the forecast month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleProjection {
    pub schedule_id: ScheduleId,
    pub name: String,
    pub kind: EntryKind,
    pub occurrences: usize,
    pub total_cents: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthForecast {
    pub window: MonthWindow,
    pub predicted_expense: Cents,
    pub predicted_income: Cents,
    pub schedules: Vec<ScheduleProjection>,
}

impl MonthForecast {
    pub fn predicted_net(&self) -> Cents {
        self.predicted_income.saturating_sub(self.predicted_expense)
    }
}

/// Count the occurrences of `schedule` that land inside `window`.
///
/// Walks forward from the later of the start date and the next run date and stops past the
/// window or past the end date. The schedule is only read.
pub fn occurrences_in(schedule: &RecurringSchedule, window: &MonthWindow) -> usize {
    let mut cursor = schedule.start_date.max(schedule.next_run_date);
    let mut count = 0;

    while cursor <= window.end && !schedule.is_past_end(cursor) {
        if cursor >= window.start {
            count += 1;
        }
        let next = schedule.frequency.advance(cursor);
        if next == cursor {
            break;
        }
        cursor = next;
    }

    count
}

/// Project the month's expense and income totals from `schedules`.
///
/// Inactive schedules are skipped; the auto-post flag is ignored.
pub fn predict(schedules: &[RecurringSchedule], window: MonthWindow) -> MonthForecast {
    let mut forecast = MonthForecast {
        window,
        predicted_expense: 0,
        predicted_income: 0,
        schedules: Vec::new(),
    };

    for schedule in schedules.iter().filter(|s| s.active) {
        let occurrences = occurrences_in(schedule, &window);
        if occurrences == 0 {
            continue;
        }

        // Saturates instead of overflowing on absurd amounts.
        let count = Cents::try_from(occurrences).unwrap_or(Cents::MAX);
        let total_cents = schedule.amount_cents.saturating_mul(count);
        match schedule.kind() {
            EntryKind::Expense => {
                forecast.predicted_expense = forecast.predicted_expense.saturating_add(total_cents)
            }
            EntryKind::Income => {
                forecast.predicted_income = forecast.predicted_income.saturating_add(total_cents)
            }
        }
        forecast.schedules.push(ScheduleProjection {
            schedule_id: schedule.id,
            name: schedule.name.clone(),
            kind: schedule.kind(),
            occurrences,
            total_cents,
        });
    }

    forecast
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::{Binding, Frequency};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn expense(name: &str, amount: Cents, frequency: Frequency, start: NaiveDate) -> RecurringSchedule {
        RecurringSchedule::new(
            name,
            amount,
            Binding::Expense { category_id: None },
            frequency,
            start,
        )
    }

    fn income(name: &str, amount: Cents, frequency: Frequency, start: NaiveDate) -> RecurringSchedule {
        RecurringSchedule::new(
            name,
            amount,
            Binding::Income {
                source: Some("Job".into()),
            },
            frequency,
            start,
        )
    }

    fn january() -> MonthWindow {
        MonthWindow::new(2025, 1).unwrap()
    }

    #[test]
    fn test_predict_mixed_schedules() {
        let schedules = vec![
            expense("Rent", 10000, Frequency::monthly_on_day(1).unwrap(), d(2025, 1, 1)),
            expense("Gym", 2500, Frequency::Weekly, d(2025, 1, 7)),
            income("Salary", 100000, Frequency::monthly_on_day(15).unwrap(), d(2025, 1, 15)),
        ];

        let forecast = predict(&schedules, january());

        // Rent once, gym on the 7th, 14th, 21st and 28th.
        assert_eq!(forecast.predicted_expense, 20000);
        assert_eq!(forecast.predicted_income, 100000);
        assert_eq!(forecast.predicted_net(), 80000);
        assert_eq!(forecast.schedules.len(), 3);
        let gym = forecast.schedules.iter().find(|p| p.name == "Gym").unwrap();
        assert_eq!(gym.occurrences, 4);
    }

    #[test]
    fn test_inactive_schedules_ignored_auto_post_irrelevant() {
        let mut paused = expense("Paused", 5000, Frequency::Monthly, d(2025, 1, 1));
        paused.active = false;
        let manual = expense("Manual", 700, Frequency::Monthly, d(2025, 1, 3)).with_auto_post(false);

        let forecast = predict(&[paused, manual], january());
        assert_eq!(forecast.predicted_expense, 700);
    }

    #[test]
    fn test_end_date_stops_simulation() {
        let schedule = expense("Trial", 1000, Frequency::Weekly, d(2025, 1, 1))
            .with_end_date(d(2025, 1, 15));
        // Jan 1, 8 and 15 only.
        assert_eq!(occurrences_in(&schedule, &january()), 3);
    }

    #[test]
    fn test_starts_from_next_run_date() {
        let schedule = expense("Weekly", 1000, Frequency::Weekly, d(2025, 1, 1))
            .with_next_run_date(d(2025, 1, 22));
        // Jan 22 and 29; earlier dates are already posted.
        assert_eq!(occurrences_in(&schedule, &january()), 2);
    }

    #[test]
    fn test_starts_before_window() {
        let schedule = expense("Biweekly", 1000, Frequency::Biweekly, d(2024, 12, 20));
        // Dec 20 -> Jan 3, 17, 31.
        assert_eq!(occurrences_in(&schedule, &january()), 3);
    }

    #[test]
    fn test_future_schedule_contributes_nothing() {
        let schedule = expense("Later", 1000, Frequency::Monthly, d(2025, 2, 1));
        let forecast = predict(&[schedule], january());
        assert_eq!(forecast.predicted_expense, 0);
        assert!(forecast.schedules.is_empty());
    }

    #[test]
    fn test_clamped_month() {
        let schedule = expense("Month end", 1000, Frequency::Monthly, d(2025, 1, 31));
        let february = MonthWindow::new(2025, 2).unwrap();
        assert_eq!(occurrences_in(&schedule, &february), 1);
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let schedules = vec![
            expense("Huge", Cents::MAX / 2, Frequency::Weekly, d(2025, 1, 1)),
            expense("Also huge", Cents::MAX / 2, Frequency::Weekly, d(2025, 1, 1)),
        ];
        let forecast = predict(&schedules, january());
        assert_eq!(forecast.predicted_expense, Cents::MAX);
        assert_eq!(forecast.predicted_net(), -Cents::MAX);
        assert_eq!(forecast.schedules[0].total_cents, Cents::MAX);
    }

    #[test]
    fn test_predict_does_not_mutate() {
        let schedules = vec![expense("Rent", 10000, Frequency::Monthly, d(2025, 1, 1))];
        let before = schedules[0].next_run_date;

        let first = predict(&schedules, january());
        let second = predict(&schedules, january());

        assert_eq!(first, second);
        assert_eq!(schedules[0].next_run_date, before);
    }
}
