use std::fs;

use rex_core::{
    DeletionMode, DeletionRequest, ExpenseLifecycle, ExpenseQuery, Mutation,
    RecurringExpenseStore, StoreError,
};
use rex_domain::{ExpenseOwner, NewRecurringExpense, RecurringExpense, YearMonth};
use rex_storage_json::{JsonExpenseStore, SCHEMA_VERSION};
use tempfile::tempdir;
use uuid::Uuid;

fn month(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).expect("valid month")
}

fn rent(start: YearMonth) -> RecurringExpense {
    RecurringExpense::root(NewRecurringExpense::new(
        ExpenseOwner::Organization(Uuid::new_v4()),
        "Rent",
        1500.0,
        "USD",
        start,
    ))
}

#[test]
fn missing_file_opens_as_empty_store() {
    let dir = tempdir().expect("tempdir");
    let store = JsonExpenseStore::open(dir.path().join("expenses.json")).expect("open");
    assert!(store
        .find_many(&ExpenseQuery::all())
        .expect("query")
        .is_empty());
    assert!(!store.path().exists());
}

#[test]
fn records_survive_reopening() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("data").join("expenses.json");
    let record = rent(month(2024, 2));

    {
        let store = JsonExpenseStore::open(&path).expect("open");
        store.create(record.clone()).expect("create");
    }

    let reopened = JsonExpenseStore::open(&path).expect("reopen");
    let loaded = reopened
        .find_one(record.id)
        .expect("find")
        .expect("record persisted");
    assert_eq!(loaded, record);

    let raw = fs::read_to_string(&path).expect("read file");
    let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(value["schema_version"], SCHEMA_VERSION);
    assert_eq!(value["records"].as_array().map(Vec::len), Some(1));
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn failed_batch_leaves_file_untouched() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("expenses.json");
    let store = JsonExpenseStore::open(&path).expect("open");
    let record = store.create(rent(month(2024, 1))).expect("create");
    let before = fs::read_to_string(&path).expect("read");

    let err = store
        .apply_batch(vec![
            Mutation::Delete(record.id),
            Mutation::Delete(Uuid::new_v4()),
        ])
        .expect_err("second delete fails");
    assert!(matches!(err, StoreError::NotFound(_)));

    assert_eq!(fs::read_to_string(&path).expect("read"), before);
    assert!(store.find_one(record.id).expect("find").is_some());
}

#[test]
fn newer_schema_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("expenses.json");
    fs::write(&path, r#"{ "schema_version": 99, "records": [] }"#).expect("write");

    let err = JsonExpenseStore::open(&path).expect_err("unsupported schema");
    assert!(matches!(err, StoreError::Backend(_)));
}

#[test]
fn lifecycle_split_is_persisted() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("expenses.json");
    let engine = ExpenseLifecycle::new(Box::new(JsonExpenseStore::open(&path).expect("open")));
    let record = engine
        .create(NewRecurringExpense::new(
            ExpenseOwner::Employee(Uuid::new_v4()),
            "Gym",
            45.0,
            "usd",
            month(2024, 1),
        ))
        .expect("create");

    engine
        .delete_by_mode(
            record.id,
            DeletionRequest::new(DeletionMode::Current, 2024, 4),
        )
        .expect("split");

    let reopened = JsonExpenseStore::open(&path).expect("reopen");
    let chain = reopened
        .find_many(&ExpenseQuery::chain(record.chain_id))
        .expect("chain");
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].end_month_key(), Some(month(2024, 3)));
    assert_eq!(chain[1].start_month_key(), month(2024, 5));
}
