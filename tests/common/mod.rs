use std::{path::PathBuf, sync::Mutex};

use once_cell::sync::Lazy;
use rex_engine::{rex_core::ExpenseLifecycle, rex_storage_json::JsonExpenseStore};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Returns a fresh directory that outlives the calling test.
#[allow(dead_code)]
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates a lifecycle backed by a JSON store in an isolated directory.
#[allow(dead_code)]
pub fn setup_json_engine() -> (ExpenseLifecycle, PathBuf) {
    let path = temp_base().join("expenses.json");
    let store = JsonExpenseStore::open(&path).expect("open json store");
    (ExpenseLifecycle::new(Box::new(store)), path)
}
