//! Storage abstraction for the mutation log.

/// SQLite-backed log.
pub mod sqlite;

use thiserror::Error;

use crate::{
    record::{MutationDraft, MutationRecord},
    types::{AuthorId, RecordId},
};

/// Backing store rejected or failed a read or write.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite rejected a statement.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// A stored row violates the record model.
    #[error("corrupt record: {0}")]
    Corrupt(String),
    /// The blocking storage task died.
    #[error("storage worker failed: {0}")]
    Worker(String),
}

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// 1-based recency rank; rank 1 is the newest record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(u64);

impl Rank {
    /// Newest record.
    pub const FIRST: Rank = Rank(1);

    /// Builds a rank from untrusted input; anything below 1 becomes 1.
    pub fn clamped(n: i64) -> Self {
        Self(n.max(1) as u64)
    }

    /// 1-based position.
    pub fn get(self) -> u64 {
        self.0
    }

    /// Number of newer records to skip.
    pub fn offset(self) -> u64 {
        self.0 - 1
    }
}

/// Append-only mutation log with ranked per-author lookup.
///
/// Implementations assign `created_at` and the record id at append time; callers never
/// supply either. Lookups order by `(created_at DESC, id DESC)`.
pub trait MutationLog: Send {
    /// Stamps and persists `draft`, returning its record id.
    fn append(&mut self, draft: MutationDraft) -> StorageResult<RecordId>;

    /// Returns `Ok(None)` when the author has fewer than `rank` records.
    fn find_nth_most_recent(&self, author: AuthorId, rank: Rank) -> StorageResult<Option<MutationRecord>>;

    /// Pushes buffered writes down to durable storage.
    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }
}
