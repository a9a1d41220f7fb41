#![doc(test(attr(deny(warnings))))]

//! Expense Tracker keeps a newest-first list of expenses, persists every
//! change to a durable key-value slot, and derives filtered views, totals,
//! and category breakdowns from it.

pub mod cli;
pub mod errors;
pub mod persistence;
pub mod store;
pub mod utils;

pub use expense_config as config;
pub use expense_core as core;
pub use expense_domain as domain;
pub use expense_storage_json as storage;

pub use errors::{Result, TrackerError};
pub use store::{ExpenseStore, LoadOutcome, StoreEvent, StoreOptions, SubscriptionId};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Expense tracker tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
