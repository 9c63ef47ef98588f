//! Persistence backends for the tinylink registry.
//!
//! The registry is an in-memory store; a [`Persistence`] backend only
//! supplies its initial contents and receives snapshots after mutations.

pub mod error;
pub mod file;
pub mod memory;

pub use error::{Result, StorageError};
pub use file::JsonFilePersistence;
pub use memory::{InMemoryPersistence, NullPersistence};

use async_trait::async_trait;
use tinylink_core::UrlRecord;

#[async_trait]
pub trait Persistence: Send + Sync + 'static {
    /// Loads every stored record, in the order they were saved.
    ///
    /// A backend with nothing stored yet returns an empty list, not an error.
    async fn load(&self) -> Result<Vec<UrlRecord>>;

    /// Replaces the stored state with `records`.
    async fn save(&self, records: &[UrlRecord]) -> Result<()>;
}
