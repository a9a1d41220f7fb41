//! The expense state container: canonical newest-first list, active view
//! filter, derived reads, change notifications, and write-behind persistence.

mod observer;

pub use observer::{StoreEvent, SubscriptionId};

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use expense_config::{Config, PersistenceMode, ValidationMode, DEFAULT_STORAGE_KEY};
use expense_core::{
    CategoryBreakdown, Clock, ExpenseService, ExpenseValidator, FilterService, KeyValueStore,
    MemoryStore, SummaryService, SystemClock,
};
use expense_domain::{Expense, ExpenseFilter, ExpenseUpdate};
use expense_storage_json::decode_expenses;
use tracing::{debug, error, info, warn};

use crate::{
    errors::Result,
    persistence::{PersistenceWriter, WriterStats},
};

use observer::ObserverRegistry;

/// Result of [`ExpenseStore::load_from_storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A well-formed payload replaced the in-memory list.
    Restored(usize),
    /// Nothing stored under the key yet.
    Empty,
    /// The payload failed to parse; the in-memory list was left as it was.
    Malformed,
    /// The backing store could not be read; the in-memory list was left as it was.
    Unavailable,
}

/// Construction options for [`ExpenseStore`].
#[derive(Clone)]
pub struct StoreOptions {
    pub storage_key: String,
    pub validation: ValidationMode,
    pub persistence: PersistenceMode,
    pub utc_offset_minutes: i32,
    pub clock: Arc<dyn Clock>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.into(),
            validation: ValidationMode::default(),
            persistence: PersistenceMode::default(),
            utc_offset_minutes: 0,
            clock: Arc::new(SystemClock),
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            storage_key: config.storage_key.clone(),
            validation: config.validation,
            persistence: config.persistence.mode,
            utc_offset_minutes: config.utc_offset_minutes,
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_persistence(mut self, persistence: PersistenceMode) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }
}

/// Explicit state container owned by the composition root.
///
/// Every mutation updates memory first, notifies subscribers, then hands a
/// full snapshot to the [`PersistenceWriter`]. Reads are served from memory.
pub struct ExpenseStore {
    expenses: Vec<Expense>,
    filter: ExpenseFilter,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    validation: ValidationMode,
    writer: PersistenceWriter,
    observers: ObserverRegistry,
    ready: bool,
}

impl ExpenseStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, options: StoreOptions) -> Self {
        let offset = FixedOffset::east_opt(options.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                warn!(
                    minutes = options.utc_offset_minutes,
                    "UTC offset out of range; using UTC"
                );
                utc_offset()
            });
        Self {
            expenses: Vec::new(),
            filter: ExpenseFilter::default(),
            clock: options.clock,
            offset,
            validation: options.validation,
            writer: PersistenceWriter::new(backend, options.storage_key, options.persistence),
            observers: ObserverRegistry::default(),
            ready: false,
        }
    }

    /// Ephemeral store writing synchronously to a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryStore::new()),
            StoreOptions::default().with_persistence(PersistenceMode::Synchronous),
        )
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn find(&self, id: &str) -> Option<&Expense> {
        ExpenseService::find(&self.expenses, id)
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn filter(&self) -> &ExpenseFilter {
        &self.filter
    }

    pub fn validation(&self) -> ValidationMode {
        self.validation
    }

    pub fn storage_key(&self) -> &str {
        self.writer.key()
    }

    /// Effective write mode; background falls back to synchronous if the writer thread cannot start.
    pub fn persistence_mode(&self) -> PersistenceMode {
        self.writer.mode()
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.offset
    }

    /// Current instant in the configured offset; the reference point for range filters.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.offset)
    }

    /// `true` once [`load_from_storage`](Self::load_from_storage) has completed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn writer_stats(&self) -> WriterStats {
        self.writer.stats()
    }

    /// Prepends `expense` so it becomes the first entry.
    pub fn add_expense(&mut self, expense: Expense) -> Result<()> {
        if self.validation == ValidationMode::Strict {
            ExpenseValidator::validate_new(&self.expenses, &expense)?;
        }
        let id = expense.id.clone();
        ExpenseService::add(&mut self.expenses, expense);
        debug!(id = %id, count = self.expenses.len(), "expense added");
        self.commit(StoreEvent::Added { id });
        Ok(())
    }

    /// Replaces the fields of the entry sharing `expense.id`.
    ///
    /// Returns `Ok(false)` and changes nothing when no entry has that id.
    pub fn update_expense(&mut self, expense: Expense) -> Result<bool> {
        if !ExpenseService::contains(&self.expenses, &expense.id) {
            warn!(id = %expense.id, "update ignored: no expense with this id");
            return Ok(false);
        }
        if self.validation == ValidationMode::Strict {
            ExpenseValidator::validate_fields(&expense)?;
        }
        let id = expense.id.clone();
        ExpenseService::update(&mut self.expenses, &expense);
        debug!(id = %id, "expense updated");
        self.commit(StoreEvent::Updated { id });
        Ok(true)
    }

    /// Overrides only the fields present in `update`.
    pub fn patch_expense(&mut self, id: &str, update: ExpenseUpdate) -> Result<bool> {
        let Some(current) = self.find(id) else {
            warn!(id, "patch ignored: no expense with this id");
            return Ok(false);
        };
        let mut edited = current.clone();
        edited.apply(&update);
        self.update_expense(edited)
    }

    /// Removes the entry with `id`. Deleting an unknown id is a no-op returning `false`.
    pub fn delete_expense(&mut self, id: &str) -> bool {
        if ExpenseService::remove(&mut self.expenses, id) == 0 {
            warn!(id, "delete ignored: no expense with this id");
            return false;
        }
        debug!(id, count = self.expenses.len(), "expense deleted");
        self.commit(StoreEvent::Deleted { id: id.to_string() });
        true
    }

    /// Replaces the active filter wholesale. Never persisted.
    pub fn set_filter(&mut self, filter: ExpenseFilter) {
        self.filter = filter;
        self.observers.notify(&StoreEvent::FilterChanged(filter));
    }

    /// Entries passing the active filter right now, newest first.
    pub fn filtered(&self) -> Vec<Expense> {
        FilterService::filtered(&self.expenses, &self.filter, &self.now())
    }

    /// Sum of amounts over [`filtered`](Self::filtered); `0.0` when nothing matches.
    pub fn total(&self) -> f64 {
        FilterService::total(FilterService::filtered_refs(
            &self.expenses,
            &self.filter,
            &self.now(),
        ))
    }

    /// Per-category totals of the filtered entries, in first-appearance order.
    pub fn category_totals(&self) -> CategoryBreakdown {
        SummaryService::breakdown(FilterService::filtered_refs(
            &self.expenses,
            &self.filter,
            &self.now(),
        ))
    }

    /// Replaces the in-memory list with the persisted snapshot, if one parses.
    ///
    /// Interim mutations made before the call are overwritten by a restored
    /// snapshot. Failures are logged and reported through the outcome only.
    pub fn load_from_storage(&mut self) -> LoadOutcome {
        if let Err(err) = self.writer.wait_idle() {
            warn!(error = %err, "could not drain pending writes before load");
        }
        if let Some(message) = self.writer.pending_error() {
            warn!(error = %message, "pending write failed before load");
        }
        let key = self.writer.key().to_string();
        let outcome = match self.writer.backend().get(&key) {
            Ok(Some(raw)) if !raw.trim().is_empty() => match decode_expenses(&raw) {
                Ok(expenses) => {
                    let count = expenses.len();
                    self.expenses = expenses;
                    info!(key = %key, count, "restored saved expenses");
                    LoadOutcome::Restored(count)
                }
                Err(err) => {
                    error!(key = %key, error = %err, "failed to load expenses");
                    LoadOutcome::Malformed
                }
            },
            Ok(_) => {
                info!(key = %key, "no saved expenses");
                LoadOutcome::Empty
            }
            Err(err) => {
                warn!(key = %key, error = %err, "expense storage unreadable");
                LoadOutcome::Unavailable
            }
        };
        self.ready = true;
        if let LoadOutcome::Restored(count) = outcome {
            self.observers.notify(&StoreEvent::Loaded { count });
        }
        outcome
    }

    /// Registers `callback` to run after every effective change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + Send + 'static,
    {
        self.observers.subscribe(Box::new(callback))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Waits for queued writes and reports the last write failure, if any.
    pub fn flush(&self) -> Result<()> {
        self.writer.flush()?;
        info!(key = %self.writer.key(), "expenses flushed");
        Ok(())
    }

    fn commit(&mut self, event: StoreEvent) {
        self.observers.notify(&event);
        self.writer.submit(self.expenses.clone());
    }
}

impl std::fmt::Debug for ExpenseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpenseStore")
            .field("expenses", &self.expenses.len())
            .field("filter", &self.filter)
            .field("offset", &self.offset)
            .field("validation", &self.validation)
            .field("ready", &self.ready)
            .field("observers", &self.observers)
            .finish()
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}
