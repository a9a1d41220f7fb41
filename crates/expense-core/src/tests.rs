use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    expense_service::ExpenseService, filter_service::FilterService, storage::KeyValueStore,
    summary_service::SummaryService, time::Clock, validation::ExpenseValidator, CoreError,
    FixedClock, MemoryStore,
};
use expense_domain::{Category, DateRange, Expense, ExpenseFilter};

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn scenario() -> Vec<Expense> {
    let mut list = Vec::new();
    ExpenseService::add(
        &mut list,
        Expense::with_id("1", "Coffee", 3.5, Category::Food, at(2024, 1, 1)),
    );
    ExpenseService::add(
        &mut list,
        Expense::with_id("2", "Bus", 1.2, Category::Transport, at(2024, 1, 2)),
    );
    list
}

#[test]
fn filter_service_keeps_canonical_order() {
    let list = scenario();
    let now = at(2024, 1, 3);
    let all = FilterService::filtered(&list, &ExpenseFilter::default(), &now);
    let ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["2", "1"]);
}

#[test]
fn filter_service_totals_by_category() {
    let list = scenario();
    let now = at(2024, 1, 3);
    let food = ExpenseFilter::new(Some(Category::Food), DateRange::All);
    let filtered = FilterService::filtered(&list, &food, &now);
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, "1");
    assert_eq!(FilterService::total(&filtered), 3.5);

    let everything = FilterService::filtered(&list, &ExpenseFilter::default(), &now);
    assert!((FilterService::total(&everything) - 4.7).abs() < 1e-9);
}

#[test]
fn filter_service_week_window_follows_clock() {
    let list = scenario();
    let clock = FixedClock::new(at(2024, 1, 8));
    let week = ExpenseFilter::default().with_range(DateRange::Week);
    let visible = FilterService::filtered(&list, &week, &clock.now());
    assert_eq!(visible.len(), 1, "only the Jan 2 entry is within 7 days");

    clock.advance(Duration::days(1));
    assert!(FilterService::filtered(&list, &week, &clock.now()).is_empty());
}

#[test]
fn total_of_nothing_is_zero() {
    assert_eq!(FilterService::total(&Vec::<Expense>::new()), 0.0);
}

#[test]
fn summary_service_groups_in_first_seen_order() {
    let mut list = scenario();
    ExpenseService::add(
        &mut list,
        Expense::with_id("3", "Sandwich", 6.5, Category::Food, at(2024, 1, 3)),
    );
    let breakdown = SummaryService::breakdown(&list);
    let order: Vec<_> = breakdown.entries.iter().map(|e| e.category).collect();
    assert_eq!(order, [Category::Food, Category::Transport]);
    assert_eq!(breakdown.get(Category::Food).unwrap().total, 10.0);
    assert_eq!(breakdown.get(Category::Food).unwrap().count, 2);
    assert!((breakdown.total - 11.2).abs() < 1e-9);
    assert_eq!(breakdown.share(Category::Bills), 0.0);
}

#[test]
fn validator_rejects_blank_titles_and_negative_amounts() {
    let mut expense = Expense::with_id("7", "  ", 1.0, Category::Other, at(2024, 1, 1));
    assert!(matches!(
        ExpenseValidator::validate_fields(&expense),
        Err(CoreError::Validation(_))
    ));

    expense.title = "Refund".into();
    expense.amount = -2.0;
    assert!(ExpenseValidator::validate_fields(&expense).is_err());

    expense.amount = f64::NAN;
    assert!(ExpenseValidator::validate_fields(&expense).is_err());
}

#[test]
fn validator_rejects_duplicate_ids_on_add() {
    let list = scenario();
    let clash = Expense::with_id("1", "Tea", 2.0, Category::Food, at(2024, 1, 5));
    assert!(matches!(
        ExpenseValidator::validate_new(&list, &clash),
        Err(CoreError::DuplicateId(id)) if id == "1"
    ));
}

#[test]
fn memory_store_reports_missing_keys_as_none() {
    let store = MemoryStore::new();
    assert_eq!(store.get("expenses_v1").unwrap(), None);
    store.set("expenses_v1", "[]").unwrap();
    let shared = store.clone();
    assert_eq!(shared.get("expenses_v1").unwrap().as_deref(), Some("[]"));
    shared.remove("expenses_v1").unwrap();
    assert!(store.is_empty());
}
