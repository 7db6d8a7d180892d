mod common;

use anyhow::Result;
use common::{date, test_service};
use recurra::application::{AppError, EntryFilter};
use recurra::domain::{Cents, EntryKind, MAX_AMOUNT_CENTS};

#[tokio::test]
async fn test_categories_are_case_insensitive() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let food = service.get_or_create_category("Food").await?;
    let again = service.get_or_create_category("  FOOD ").await?;
    assert_eq!(food.id, again.id);
    assert_eq!(again.name, "Food");

    service.get_or_create_category("Books").await?;
    let names: Vec<_> = service
        .list_categories()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Books", "Food"]);

    assert!(matches!(
        service.get_or_create_category("   ").await,
        Err(AppError::EmptyCategoryName)
    ));
    assert!(matches!(
        service.get_category("Travel").await,
        Err(AppError::CategoryNotFound(name)) if name == "Travel"
    ));

    Ok(())
}

#[tokio::test]
async fn test_add_expense_and_income() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let expense = service
        .add_expense(
            date("2025-02-03"),
            1250,
            Some("Coffee"),
            Some("beans".to_string()),
        )
        .await?;
    let stored = service.get_entry(expense.id).await?;
    assert_eq!(stored.amount_cents, 1250);
    assert_eq!(stored.category_id, expense.category_id);
    assert_eq!(stored.kind, EntryKind::Expense);
    assert_eq!(stored.description.as_deref(), Some("beans"));
    assert!(!stored.is_recurring());

    // No category means the default one
    let uncategorized = service
        .add_expense(date("2025-02-04"), 800, None, None)
        .await?;
    let general = service.get_category("General").await?;
    assert_eq!(uncategorized.category_id, Some(general.id));

    let income = service
        .add_income(date("2025-02-05"), 90000, Some(" "), None)
        .await?;
    assert_eq!(income.source.as_deref(), Some("Other"));
    assert_eq!(income.category_id, None);

    assert!(matches!(
        service.add_expense(date("2025-02-05"), 0, None, None).await,
        Err(AppError::InvalidAmount(_))
    ));
    assert!(matches!(
        service.add_income(date("2025-02-05"), -1, None, None).await,
        Err(AppError::InvalidAmount(_))
    ));
    assert!(matches!(
        service
            .add_expense(date("2025-02-05"), MAX_AMOUNT_CENTS + 1, None, None)
            .await,
        Err(AppError::InvalidAmount(_))
    ));
    assert!(matches!(
        service
            .add_income(date("2025-02-05"), Cents::MAX, None, None)
            .await,
        Err(AppError::InvalidAmount(_))
    ));
    service
        .add_income(date("2025-02-06"), MAX_AMOUNT_CENTS, None, None)
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_list_entries_filters() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .add_expense(date("2025-01-10"), 1000, Some("Food"), None)
        .await?;
    service
        .add_expense(date("2025-01-20"), 2000, Some("Fuel"), None)
        .await?;
    service
        .add_expense(date("2025-02-01"), 3000, Some("Food"), None)
        .await?;
    service
        .add_income(date("2025-01-15"), 50000, Some("Employer"), None)
        .await?;

    let all = service.list_entries(&EntryFilter::default()).await?;
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].date, date("2025-02-01"));

    let food = service
        .list_entries(&EntryFilter {
            category: Some("food".into()),
            ..Default::default()
        })
        .await?;
    assert_eq!(food.len(), 2);

    let january_expenses = service
        .list_entries(&EntryFilter {
            kind: Some(EntryKind::Expense),
            from_date: Some(date("2025-01-01")),
            to_date: Some(date("2025-01-31")),
            ..Default::default()
        })
        .await?;
    let amounts: Vec<_> = january_expenses.iter().map(|e| e.amount_cents).collect();
    assert_eq!(amounts, vec![2000, 1000]);

    let latest = service
        .list_entries(&EntryFilter {
            limit: Some(1),
            ..Default::default()
        })
        .await?;
    assert_eq!(latest.len(), 1);

    assert!(matches!(
        service
            .list_entries(&EntryFilter {
                category: Some("Missing".into()),
                ..Default::default()
            })
            .await,
        Err(AppError::CategoryNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_delete_entry() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let entry = service
        .add_expense(date("2025-01-10"), 1000, Some("Food"), None)
        .await?;
    service.delete_entry(entry.id).await?;

    assert!(matches!(
        service.get_entry(entry.id).await,
        Err(AppError::EntryNotFound(_))
    ));
    assert!(matches!(
        service.delete_entry(entry.id).await,
        Err(AppError::EntryNotFound(_))
    ));

    Ok(())
}
