//! Runtime event stream payloads.

use crate::types::{AuthorId, MessageId, MutationKind, RecordId};

/// Events emitted from the single-writer runtime loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// A record was persisted.
    Appended {
        /// Assigned record id.
        id: RecordId,
        /// Author of the mutated message.
        author_id: AuthorId,
        /// Kind of mutation.
        kind: MutationKind,
    },
    /// A queued append failed; the mutation is lost.
    AppendFailed {
        /// Message whose mutation was dropped.
        message_id: MessageId,
    },
}
