//! expense-core
//!
//! Business rules over expense collections: list mutation, filtering,
//! aggregation, validation, and the persistence contract.
//! Depends on expense-domain. No CLI, no terminal I/O, no concrete storage backend
//! beyond the in-memory one.

pub mod error;
pub mod expense_service;
pub mod filter_service;
pub mod storage;
pub mod summary_service;
pub mod time;
pub mod validation;

pub use error::CoreError;
pub use expense_service::*;
pub use filter_service::*;
pub use storage::{KeyValueStore, MemoryStore};
pub use summary_service::*;
pub use time::{Clock, FixedClock, SystemClock};
pub use validation::*;

#[cfg(test)]
mod tests;
