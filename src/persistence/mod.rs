//! Write-behind persistence of expense snapshots.

mod writer;

pub use writer::{PersistenceWriter, WriterStats};
