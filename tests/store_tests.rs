mod common;

use std::sync::{Arc, Mutex};

use chrono::Duration;
use common::*;
use expense_tracker::{
    core::KeyValueStore,
    domain::{Category, DateRange, Expense, ExpenseFilter, ExpenseUpdate},
    LoadOutcome, StoreEvent, TrackerError,
};

#[test]
fn newest_expense_comes_first() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();
    let ids: Vec<_> = store.expenses().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["2", "1"]);
}

#[test]
fn category_filter_narrows_list_and_total() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();

    store.set_filter(ExpenseFilter::new(Some(Category::Food), DateRange::All));
    assert_eq!(store.filtered(), vec![coffee()]);
    assert_eq!(store.total(), 3.5);

    store.set_filter(ExpenseFilter::default());
    assert!((store.total() - 4.7).abs() < 1e-9);
}

#[test]
fn empty_selection_totals_zero() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    assert_eq!(store.total(), 0.0);
    store.add_expense(coffee()).unwrap();
    store.set_filter(ExpenseFilter::new(Some(Category::Bills), DateRange::All));
    assert!(store.filtered().is_empty());
    assert_eq!(store.total(), 0.0);
    assert!(store.category_totals().is_empty());
}

#[test]
fn delete_is_idempotent() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();
    assert!(store.delete_expense("1"));
    assert!(!store.delete_expense("1"));
    assert_eq!(store.expenses(), &[bus()]);
}

#[test]
fn update_keeps_identity_and_position() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();

    let mut edited = coffee();
    edited.title = "Espresso".into();
    edited.amount = 4.0;
    assert!(store.update_expense(edited.clone()).unwrap());
    assert_eq!(store.len(), 2);
    assert_eq!(store.expenses()[1], edited);
}

#[test]
fn update_with_unknown_id_changes_nothing() {
    let (backend, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();
    let before = store.expenses().to_vec();
    let saved = backend.get(KEY).unwrap();

    let stranger = Expense::with_id("99", "X", 1.0, Category::Other, utc(2024, 1, 1, 0));
    assert!(!store.update_expense(stranger).unwrap());
    assert_eq!(store.expenses(), before.as_slice());
    assert_eq!(backend.get(KEY).unwrap(), saved);
}

#[test]
fn patch_overrides_only_given_fields() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    assert!(store
        .patch_expense("1", ExpenseUpdate::default().amount(5.25))
        .unwrap());
    let patched = store.find("1").unwrap();
    assert_eq!(patched.amount, 5.25);
    assert_eq!(patched.title, "Coffee");
    assert!(!store.patch_expense("404", ExpenseUpdate::default()).unwrap());
}

#[test]
fn filtered_reads_do_not_mutate() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();
    store.set_filter(ExpenseFilter::new(None, DateRange::Week));
    let first = (store.filtered(), store.total(), store.category_totals());
    let second = (store.filtered(), store.total(), store.category_totals());
    assert_eq!(first, second);
    assert_eq!(store.len(), 2);
    assert_eq!(store.filter().range, DateRange::Week);
}

#[test]
fn range_filters_follow_the_clock() {
    let now = utc(2024, 5, 10, 12);
    let (_, clock, mut store) = memory_store(now);
    store
        .add_expense(Expense::with_id("old", "Rent", 900.0, Category::Bills, now - Duration::days(20)))
        .unwrap();
    store
        .add_expense(Expense::with_id("mid", "Train", 12.0, Category::Transport, now - Duration::days(3)))
        .unwrap();
    store
        .add_expense(Expense::with_id("new", "Lunch", 8.0, Category::Food, now - Duration::hours(2)))
        .unwrap();

    store.set_filter(ExpenseFilter::new(None, DateRange::Day));
    assert_eq!(store.total(), 8.0);
    store.set_filter(ExpenseFilter::new(None, DateRange::Week));
    assert_eq!(store.total(), 20.0);
    store.set_filter(ExpenseFilter::new(None, DateRange::Month));
    assert_eq!(store.total(), 920.0);

    clock.advance(Duration::days(1));
    store.set_filter(ExpenseFilter::new(None, DateRange::Day));
    assert_eq!(store.total(), 0.0);
}

#[test]
fn month_follows_the_configured_offset() {
    let backend = expense_tracker::core::MemoryStore::new();
    let clock = expense_tracker::core::FixedClock::new(utc(2024, 5, 10, 0));
    let store_options = expense_tracker::StoreOptions::default()
        .with_persistence(expense_tracker::config::PersistenceMode::Synchronous)
        .with_utc_offset_minutes(330)
        .with_clock(Arc::new(clock));
    let mut store = expense_tracker::ExpenseStore::new(Arc::new(backend), store_options);
    // 20:00 UTC on April 30th is already May 1st at +05:30.
    store
        .add_expense(Expense::with_id("1", "Chai", 1.0, Category::Food, utc(2024, 4, 30, 20)))
        .unwrap();
    store.set_filter(ExpenseFilter::new(None, DateRange::Month));
    assert_eq!(store.filtered().len(), 1);
}

#[test]
fn breakdown_groups_in_first_seen_order() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();
    store
        .add_expense(Expense::with_id("3", "Bagel", 2.5, Category::Food, utc(2024, 1, 2, 8)))
        .unwrap();

    let breakdown = store.category_totals();
    let order: Vec<_> = breakdown.entries.iter().map(|e| e.category).collect();
    assert_eq!(order, [Category::Food, Category::Transport]);
    assert_eq!(breakdown.get(Category::Food).unwrap().total, 6.0);
    assert_eq!(breakdown.get(Category::Food).unwrap().count, 2);
}

#[test]
fn strict_validation_rejects_bad_records() {
    let (backend, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();

    let duplicate = store.add_expense(coffee());
    assert!(matches!(duplicate, Err(TrackerError::DuplicateId(id)) if id == "1"));

    let mut blank = bus();
    blank.title = "   ".into();
    assert!(matches!(store.add_expense(blank), Err(TrackerError::Validation(_))));

    let mut negative = bus();
    negative.amount = -1.0;
    assert!(matches!(store.add_expense(negative), Err(TrackerError::Validation(_))));

    let mut nan = coffee();
    nan.amount = f64::NAN;
    assert!(matches!(store.update_expense(nan), Err(TrackerError::Validation(_))));

    assert_eq!(store.expenses(), &[coffee()]);
    assert!(backend.get(KEY).unwrap().unwrap().contains("Coffee"));
}

#[test]
fn validation_off_accepts_anything() {
    let (_, mut store) = lenient_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(coffee()).unwrap();
    let mut odd = bus();
    odd.title.clear();
    odd.amount = -4.0;
    store.add_expense(odd).unwrap();
    assert_eq!(store.len(), 3);
    assert!(store.delete_expense("1"));
    assert_eq!(store.len(), 2, "delete removes every entry sharing the id");
}

#[test]
fn round_trip_through_storage() {
    let (backend, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();
    store
        .patch_expense("2", ExpenseUpdate::default().title("Night bus"))
        .unwrap();
    store
        .add_expense(Expense::with_id("3", "Gone", 1.0, Category::Other, utc(2024, 1, 2, 0)))
        .unwrap();
    store.delete_expense("3");

    let mut reloaded = expense_tracker::ExpenseStore::new(
        Arc::new(backend.clone()),
        expense_tracker::StoreOptions::default()
            .with_persistence(expense_tracker::config::PersistenceMode::Synchronous),
    );
    assert!(!reloaded.is_ready());
    assert_eq!(reloaded.load_from_storage(), LoadOutcome::Restored(2));
    assert!(reloaded.is_ready());
    assert_eq!(reloaded.expenses(), store.expenses());
}

#[test]
fn persisted_payload_matches_record_shape() {
    let (backend, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    assert_eq!(
        backend.get(KEY).unwrap().unwrap(),
        r#"[{"id":"1","title":"Coffee","amount":3.5,"category":"Food","date":"2024-01-01T00:00:00.000Z"}]"#
    );
}

#[test]
fn malformed_payload_leaves_memory_untouched() {
    let (backend, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    store.add_expense(coffee()).unwrap();
    backend.set(KEY, "{not json").unwrap();
    assert_eq!(store.load_from_storage(), LoadOutcome::Malformed);
    assert_eq!(store.expenses(), &[coffee()]);
    assert!(store.is_ready());
}

#[test]
fn missing_or_blank_payload_is_empty() {
    let (backend, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    assert_eq!(store.load_from_storage(), LoadOutcome::Empty);
    backend.set(KEY, "").unwrap();
    assert_eq!(store.load_from_storage(), LoadOutcome::Empty);
    assert!(store.is_empty());
}

#[test]
fn load_replaces_memory_with_the_saved_snapshot() {
    let (backend, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    // Reads are allowed before the load completes.
    assert!(store.is_empty());
    backend
        .set(KEY, &expense_tracker::storage::encode_expenses(&[bus()]).unwrap())
        .unwrap();
    assert_eq!(store.load_from_storage(), LoadOutcome::Restored(1));
    assert_eq!(store.expenses(), &[bus()]);
}

#[test]
fn interim_mutations_are_flushed_before_load() {
    let backend = expense_tracker::core::MemoryStore::new();
    let mut store = expense_tracker::ExpenseStore::new(
        Arc::new(backend.clone()),
        expense_tracker::StoreOptions::default()
            .with_persistence(expense_tracker::config::PersistenceMode::Background),
    );
    store.add_expense(coffee()).unwrap();
    store.add_expense(bus()).unwrap();
    assert_eq!(store.load_from_storage(), LoadOutcome::Restored(2));
    assert_eq!(store.expenses(), &[bus(), coffee()]);
}

#[test]
fn observers_see_each_effective_change() {
    let (_, _, mut store) = memory_store(utc(2024, 1, 3, 0));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    store.add_expense(coffee()).unwrap();
    store.update_expense(coffee()).unwrap();
    store.update_expense(bus()).unwrap();
    store.delete_expense("1");
    store.delete_expense("1");
    store.set_filter(ExpenseFilter::new(Some(Category::Food), DateRange::Day));

    assert!(store.unsubscribe(subscription));
    assert!(!store.unsubscribe(subscription));
    store.add_expense(bus()).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            StoreEvent::Added { id: "1".into() },
            StoreEvent::Updated { id: "1".into() },
            StoreEvent::Deleted { id: "1".into() },
            StoreEvent::FilterChanged(ExpenseFilter::new(Some(Category::Food), DateRange::Day)),
        ]
    );
}

#[test]
fn unreadable_storage_is_reported_not_raised() {
    let mut store = expense_tracker::ExpenseStore::new(
        Arc::new(BrokenStore),
        expense_tracker::StoreOptions::default()
            .with_persistence(expense_tracker::config::PersistenceMode::Synchronous),
    );
    store.add_expense(coffee()).unwrap();
    assert_eq!(store.load_from_storage(), LoadOutcome::Unavailable);
    assert_eq!(store.len(), 1);
}
