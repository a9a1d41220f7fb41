#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, TimeZone, Utc};
use expense_tracker::{
    config::{PersistenceMode, ValidationMode},
    core::{CoreError, FixedClock, KeyValueStore, MemoryStore},
    domain::{Category, Expense},
    ExpenseStore, StoreOptions,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub const KEY: &str = "expenses_v1";

/// Creates a unique directory that outlives the calling test.
pub fn temp_base_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn coffee() -> Expense {
    Expense::with_id("1", "Coffee", 3.5, Category::Food, utc(2024, 1, 1, 0))
}

pub fn bus() -> Expense {
    Expense::with_id("2", "Bus", 1.2, Category::Transport, utc(2024, 1, 2, 0))
}

/// Store over a shared in-memory backend, writing synchronously, clock frozen at `now`.
pub fn memory_store(now: DateTime<Utc>) -> (MemoryStore, FixedClock, ExpenseStore) {
    let backend = MemoryStore::new();
    let clock = FixedClock::new(now);
    let store = ExpenseStore::new(
        Arc::new(backend.clone()),
        StoreOptions::default()
            .with_persistence(PersistenceMode::Synchronous)
            .with_clock(Arc::new(clock.clone())),
    );
    (backend, clock, store)
}

/// Same as [`memory_store`] with validation disabled.
pub fn lenient_store(now: DateTime<Utc>) -> (MemoryStore, ExpenseStore) {
    let backend = MemoryStore::new();
    let store = ExpenseStore::new(
        Arc::new(backend.clone()),
        StoreOptions::default()
            .with_persistence(PersistenceMode::Synchronous)
            .with_validation(ValidationMode::Off)
            .with_clock(Arc::new(FixedClock::new(now))),
    );
    (backend, store)
}

/// Backend whose reads and writes always fail.
#[derive(Debug, Default)]
pub struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, CoreError> {
        Err(CoreError::Storage("disk unplugged".into()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), CoreError> {
        Err(CoreError::Storage("quota exceeded".into()))
    }

    fn remove(&self, _key: &str) -> Result<(), CoreError> {
        Err(CoreError::Storage("disk unplugged".into()))
    }
}
