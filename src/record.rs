//! Mutation log record, draft, and attachment types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AuthorId, ChannelId, MessageId, MutationKind, RecordId};

/// Media reference attached to the pre-mutation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Media URL.
    pub url: String,
    /// Original filename.
    pub filename: String,
    /// MIME type as reported by the platform, if any.
    pub content_type: Option<String>,
}

/// Author identity denormalized at event time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    /// Stable author id.
    pub id: AuthorId,
    /// Display name at the time of the event.
    pub name: String,
    /// Avatar media reference, if any.
    pub avatar_url: Option<String>,
}

/// What happened to the message.
///
/// Deletions carry no post-mutation text; edits always do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// The message was deleted.
    Delete,
    /// The message text was replaced.
    Edit {
        /// Text after the edit.
        content_after: String,
    },
}

impl Mutation {
    /// Returns the kind tag of this mutation.
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Delete => MutationKind::Delete,
            Self::Edit { .. } => MutationKind::Edit,
        }
    }

    /// Text after the mutation; `None` for deletions.
    pub fn content_after(&self) -> Option<&str> {
        match self {
            Self::Delete => None,
            Self::Edit { content_after } => Some(content_after),
        }
    }
}

/// Normalized mutation waiting to be appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationDraft {
    /// Original message id.
    pub message_id: MessageId,
    /// Author of the original message.
    pub author: AuthorRef,
    /// Channel the message lived in.
    pub channel_id: ChannelId,
    /// Text prior to the mutation; empty when the message had none.
    pub content_before: String,
    /// Mutation payload.
    pub mutation: Mutation,
    /// Attachments of the pre-mutation message.
    pub attachments: Vec<AttachmentRef>,
}

/// Immutable, stamped record of one mutation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Store-assigned insertion sequence.
    pub id: RecordId,
    /// Store-side UTC timestamp; the ordering key.
    pub created_at: DateTime<Utc>,
    /// Original message id.
    pub message_id: MessageId,
    /// Author of the original message.
    pub author: AuthorRef,
    /// Channel the message lived in.
    pub channel_id: ChannelId,
    /// Text prior to the mutation.
    pub content_before: String,
    /// Mutation payload.
    pub mutation: Mutation,
    /// Attachments of the pre-mutation message.
    pub attachments: Vec<AttachmentRef>,
}

impl MutationRecord {
    /// Stamps a draft into a record.
    pub fn from_draft(id: RecordId, created_at: DateTime<Utc>, draft: MutationDraft) -> Self {
        Self {
            id,
            created_at,
            message_id: draft.message_id,
            author: draft.author,
            channel_id: draft.channel_id,
            content_before: draft.content_before,
            mutation: draft.mutation,
            attachments: draft.attachments,
        }
    }

    /// Kind of this mutation.
    pub fn kind(&self) -> MutationKind {
        self.mutation.kind()
    }

    /// Text after the mutation; `None` exactly for deletions.
    pub fn content_after(&self) -> Option<&str> {
        self.mutation.content_after()
    }
}
