use std::{
    sync::{
        mpsc::{self, Receiver, Sender},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    thread::{self, JoinHandle},
};

use expense_config::PersistenceMode;
use expense_core::KeyValueStore;
use expense_domain::Expense;
use expense_storage_json::encode_expenses;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::errors::{Result, TrackerError};

/// Counters describing what the writer has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WriterStats {
    /// Snapshots that reached the backing store.
    pub writes: u64,
    /// Snapshots superseded by a newer one before they were written.
    pub coalesced: u64,
    pub failures: u64,
    /// Most recent failure not yet reported through [`PersistenceWriter::flush`].
    pub last_error: Option<String>,
}

enum WriterMessage {
    Write(Vec<Expense>),
    Flush(Sender<()>),
    Shutdown,
}

struct Worker {
    sender: Sender<WriterMessage>,
    handle: Option<JoinHandle<()>>,
}

/// Serializes the full collection under one key after every change.
///
/// In background mode snapshots are handed to a dedicated thread. Writes land
/// in submission order, and a burst of queued snapshots collapses into the
/// newest one. Dropping the writer drains the queue before returning.
pub struct PersistenceWriter {
    key: String,
    backend: Arc<dyn KeyValueStore>,
    mode: PersistenceMode,
    stats: Arc<Mutex<WriterStats>>,
    worker: Option<Worker>,
}

impl PersistenceWriter {
    pub fn new(
        backend: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        mode: PersistenceMode,
    ) -> Self {
        let key = key.into();
        let stats = Arc::new(Mutex::new(WriterStats::default()));
        let worker = match mode {
            PersistenceMode::Synchronous => None,
            PersistenceMode::Background => {
                spawn_worker(Arc::clone(&backend), key.clone(), Arc::clone(&stats))
            }
        };
        // Fall back to inline writes when the thread could not be started.
        let mode = if worker.is_some() {
            mode
        } else {
            PersistenceMode::Synchronous
        };
        Self {
            key,
            backend,
            mode,
            stats,
            worker,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn mode(&self) -> PersistenceMode {
        self.mode
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }

    pub fn stats(&self) -> WriterStats {
        lock_stats(&self.stats).clone()
    }

    /// Most recent unreported write failure, left in place for [`flush`](Self::flush).
    pub fn pending_error(&self) -> Option<String> {
        lock_stats(&self.stats).last_error.clone()
    }

    /// Schedules `snapshot` to replace the stored collection.
    ///
    /// Failures are logged and recorded; they surface on the next [`flush`](Self::flush).
    pub fn submit(&self, snapshot: Vec<Expense>) {
        match &self.worker {
            Some(worker) => {
                if let Err(mpsc::SendError(message)) =
                    worker.sender.send(WriterMessage::Write(snapshot))
                {
                    warn!(key = %self.key, "persistence thread gone; writing inline");
                    if let WriterMessage::Write(snapshot) = message {
                        write_snapshot(self.backend.as_ref(), &self.key, &snapshot, &self.stats);
                    }
                }
            }
            None => write_snapshot(self.backend.as_ref(), &self.key, &snapshot, &self.stats),
        }
    }

    /// Blocks until every snapshot submitted so far has been written.
    ///
    /// Returns the most recent write failure since the previous flush, if any.
    pub fn flush(&self) -> Result<()> {
        self.wait_idle()?;
        match lock_stats(&self.stats).last_error.take() {
            Some(message) => Err(TrackerError::Storage(message)),
            None => Ok(()),
        }
    }

    /// Blocks until the queue is drained without consuming a recorded failure.
    pub fn wait_idle(&self) -> Result<()> {
        if let Some(worker) = &self.worker {
            let (ack_tx, ack_rx) = mpsc::channel();
            worker
                .sender
                .send(WriterMessage::Flush(ack_tx))
                .map_err(|_| TrackerError::Persistence("writer thread stopped".into()))?;
            ack_rx
                .recv()
                .map_err(|_| TrackerError::Persistence("writer thread stopped".into()))?;
        }
        Ok(())
    }
}

impl Drop for PersistenceWriter {
    fn drop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            let _ = worker.sender.send(WriterMessage::Shutdown);
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!(key = %self.key, "persistence thread panicked");
                }
            }
        }
    }
}

fn spawn_worker(
    backend: Arc<dyn KeyValueStore>,
    key: String,
    stats: Arc<Mutex<WriterStats>>,
) -> Option<Worker> {
    let (sender, receiver) = mpsc::channel();
    let thread_key = key.clone();
    let spawned = thread::Builder::new()
        .name("expense-writer".into())
        .spawn(move || run_worker(receiver, backend.as_ref(), &thread_key, &stats));
    match spawned {
        Ok(handle) => Some(Worker {
            sender,
            handle: Some(handle),
        }),
        Err(err) => {
            error!(key = %key, error = %err, "failed to start persistence thread");
            None
        }
    }
}

fn run_worker(
    receiver: Receiver<WriterMessage>,
    backend: &dyn KeyValueStore,
    key: &str,
    stats: &Mutex<WriterStats>,
) {
    while let Ok(first) = receiver.recv() {
        let mut latest: Option<Vec<Expense>> = None;
        let mut waiters = Vec::new();
        let mut shutdown = false;

        for message in std::iter::once(first).chain(receiver.try_iter()) {
            match message {
                WriterMessage::Write(snapshot) => {
                    if latest.replace(snapshot).is_some() {
                        lock_stats(stats).coalesced += 1;
                    }
                }
                WriterMessage::Flush(ack) => waiters.push(ack),
                WriterMessage::Shutdown => shutdown = true,
            }
        }

        if let Some(snapshot) = latest {
            write_snapshot(backend, key, &snapshot, stats);
        }
        for ack in waiters {
            let _ = ack.send(());
        }
        if shutdown {
            break;
        }
    }
    debug!(key, "persistence thread stopped");
}

fn write_snapshot(
    backend: &dyn KeyValueStore,
    key: &str,
    snapshot: &[Expense],
    stats: &Mutex<WriterStats>,
) {
    match encode_expenses(snapshot).and_then(|payload| backend.set(key, &payload)) {
        Ok(()) => {
            debug!(key, count = snapshot.len(), "persisted expense snapshot");
            lock_stats(stats).writes += 1;
        }
        Err(err) => {
            error!(key, error = %err, "failed to persist expenses");
            let mut stats = lock_stats(stats);
            stats.failures += 1;
            stats.last_error = Some(err.to_string());
        }
    }
}

/// Counters stay usable after a panic elsewhere poisoned the lock.
fn lock_stats(stats: &Mutex<WriterStats>) -> MutexGuard<'_, WriterStats> {
    stats.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use expense_core::{CoreError, MemoryStore};
    use expense_domain::Category;

    fn expense(id: &str) -> Expense {
        Expense::with_id(
            id,
            "Coffee",
            3.5,
            Category::Food,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn synchronous_mode_writes_before_returning() {
        let memory = MemoryStore::new();
        let writer = PersistenceWriter::new(
            Arc::new(memory.clone()),
            "expenses_v1",
            PersistenceMode::Synchronous,
        );
        writer.submit(vec![expense("1")]);
        let raw = memory.get("expenses_v1").unwrap().unwrap();
        assert!(raw.contains("\"id\":\"1\""));
        assert_eq!(writer.stats().writes, 1);
    }

    #[test]
    fn background_flush_leaves_the_latest_snapshot() {
        let memory = MemoryStore::new();
        let writer = PersistenceWriter::new(
            Arc::new(memory.clone()),
            "expenses_v1",
            PersistenceMode::Background,
        );
        writer.submit(vec![expense("1")]);
        writer.submit(vec![expense("2"), expense("1")]);
        writer.flush().unwrap();
        let raw = memory.get("expenses_v1").unwrap().unwrap();
        assert!(raw.starts_with("[{\"id\":\"2\""));
        let stats = writer.stats();
        assert_eq!(stats.writes + stats.coalesced, 2);
    }

    #[test]
    fn drop_drains_pending_writes() {
        let memory = MemoryStore::new();
        {
            let writer = PersistenceWriter::new(
                Arc::new(memory.clone()),
                "k",
                PersistenceMode::Background,
            );
            writer.submit(vec![expense("1")]);
        }
        assert!(memory.get("k").unwrap().is_some());
    }

    struct FullDisk;

    impl KeyValueStore for FullDisk {
        fn get(&self, _key: &str) -> std::result::Result<Option<String>, CoreError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> std::result::Result<(), CoreError> {
            Err(CoreError::Storage("no space left".into()))
        }

        fn remove(&self, _key: &str) -> std::result::Result<(), CoreError> {
            Ok(())
        }
    }

    #[test]
    fn failures_are_recorded_after_the_stats_lock_was_poisoned() {
        let stats = Arc::new(Mutex::new(WriterStats::default()));
        let poisoner = Arc::clone(&stats);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the stats lock");
        })
        .join();
        assert!(stats.is_poisoned());

        write_snapshot(&FullDisk, "k", &[expense("1")], &stats);
        let recorded = lock_stats(&stats);
        assert_eq!(recorded.failures, 1);
        assert!(recorded
            .last_error
            .as_deref()
            .is_some_and(|message| message.contains("no space left")));
    }

    #[test]
    fn wait_idle_leaves_the_failure_for_flush() {
        let writer = PersistenceWriter::new(Arc::new(FullDisk), "k", PersistenceMode::Background);
        writer.submit(vec![expense("1")]);
        writer.wait_idle().unwrap();
        assert!(writer.pending_error().is_some());
        assert!(writer.flush().is_err());
        assert!(writer.pending_error().is_none());
    }
}
