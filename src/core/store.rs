use std::sync::Arc;

use hashbrown::HashMap;

use crate::{
    persist::{MutationLog, Rank, StorageResult},
    record::{MutationDraft, MutationRecord},
    types::{AuthorId, RecordId},
};

use super::{
    clock::{Clock, MonotonicStamper, SystemClock},
    indices::VecIndex,
};

/// In-memory [`MutationLog`].
///
/// Stamps are non-decreasing and ids strictly increasing, so each per-author id list is
/// already sorted by `(created_at, id)` and the Nth most recent record is found by index.
pub struct MemoryMutationLog {
    records: HashMap<RecordId, MutationRecord>,
    by_author: VecIndex<AuthorId>,
    stamper: MonotonicStamper,
    next_id: RecordId,
}

impl Default for MemoryMutationLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMutationLog {
    /// Empty log stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Empty log stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: HashMap::new(),
            by_author: VecIndex::new(),
            stamper: MonotonicStamper::new(clock),
            next_id: 1,
        }
    }

    /// Infallible append.
    pub fn insert(&mut self, draft: MutationDraft) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;

        let record = MutationRecord::from_draft(id, self.stamper.stamp(), draft);
        self.by_author.entry(record.author.id).or_default().push(id);
        self.records.insert(id, record);
        id
    }

    /// Record by id.
    pub fn get(&self, id: RecordId) -> Option<&MutationRecord> {
        self.records.get(&id)
    }

    /// Borrowing form of [`MutationLog::find_nth_most_recent`].
    pub fn nth_most_recent(&self, author: AuthorId, rank: Rank) -> Option<&MutationRecord> {
        let ids = self.by_author.get(&author)?;
        let skip = usize::try_from(rank.offset()).ok()?;
        ids.iter().rev().nth(skip).and_then(|id| self.records.get(id))
    }

    /// Number of records across all authors.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True before the first append.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MutationLog for MemoryMutationLog {
    fn append(&mut self, draft: MutationDraft) -> StorageResult<RecordId> {
        Ok(self.insert(draft))
    }

    fn find_nth_most_recent(&self, author: AuthorId, rank: Rank) -> StorageResult<Option<MutationRecord>> {
        Ok(self.nth_most_recent(author, rank).cloned())
    }
}
