//! Shared primitive IDs and the mutation kind enum.

use serde::{Deserialize, Serialize};

/// Platform identifier of the original message.
pub type MessageId = u64;
/// Stable per-user identity; the primary lookup key.
pub type AuthorId = u64;
/// Channel identifier.
pub type ChannelId = u64;
/// Store-assigned insertion sequence of a log record.
pub type RecordId = u64;

/// Kind of mutation applied to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    /// The message was deleted.
    Delete,
    /// The message text was edited.
    Edit,
}

impl MutationKind {
    /// Stable integer code used by storage backends.
    pub fn code(self) -> i64 {
        match self {
            Self::Delete => 1,
            Self::Edit => 2,
        }
    }

    /// Inverse of [`MutationKind::code`].
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Delete),
            2 => Some(Self::Edit),
            _ => None,
        }
    }
}
