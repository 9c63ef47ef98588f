use crate::error::Result;
use crate::Persistence;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tinylink_core::UrlRecord;

/// Keeps the last saved snapshot in memory.
///
/// Nothing survives the process; useful for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    records: Mutex<Vec<UrlRecord>>,
    saves: AtomicUsize,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend whose first `load` returns `records`.
    pub fn with_records(records: Vec<UrlRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            saves: AtomicUsize::new(0),
        }
    }

    /// The most recently saved snapshot.
    pub fn records(&self) -> Vec<UrlRecord> {
        self.records.lock().clone()
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Persistence for InMemoryPersistence {
    async fn load(&self) -> Result<Vec<UrlRecord>> {
        Ok(self.records.lock().clone())
    }

    async fn save(&self, records: &[UrlRecord]) -> Result<()> {
        *self.records.lock() = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A backend that stores nothing: loads are empty and saves are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPersistence;

#[async_trait]
impl Persistence for NullPersistence {
    async fn load(&self) -> Result<Vec<UrlRecord>> {
        Ok(Vec::new())
    }

    async fn save(&self, _records: &[UrlRecord]) -> Result<()> {
        Ok(())
    }
}
