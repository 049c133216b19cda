//! Event normalizer: turns raw gateway snapshots into log drafts.
//!
//! Filtering policy:
//! - bot-authored messages never produce a draft;
//! - a deletion with empty text and no attachments produces nothing;
//! - an edit whose text is byte-for-byte unchanged produces nothing (link-preview
//!   expansion is reported by the platform as such an edit).
//!
//! `Ok(None)` means "filtered"; `Err` means the snapshot lacked a required identity field.

use thiserror::Error;

use crate::{
    record::{AttachmentRef, AuthorRef, Mutation, MutationDraft},
    types::{AuthorId, ChannelId, MessageId},
};

/// Message author as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorSnapshot {
    /// Author id; required.
    pub id: Option<AuthorId>,
    /// Display name.
    pub name: String,
    /// Avatar media reference.
    pub avatar_url: Option<String>,
    /// True for bot accounts.
    pub is_bot: bool,
}

/// Attachment as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentSnapshot {
    /// Media URL.
    pub url: String,
    /// Original filename.
    pub filename: String,
    /// MIME type, when the platform knows it.
    pub content_type: Option<String>,
}

/// Point-in-time view of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSnapshot {
    /// Message id; required.
    pub id: Option<MessageId>,
    /// Author; required.
    pub author: Option<AuthorSnapshot>,
    /// Channel id; required.
    pub channel_id: Option<ChannelId>,
    /// Message text.
    pub content: String,
    /// Attachments in platform order.
    pub attachments: Vec<AttachmentSnapshot>,
}

/// Raw mutation notification from the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A message was deleted.
    Deleted(MessageSnapshot),
    /// A message was edited.
    Edited {
        /// Snapshot before the edit.
        before: MessageSnapshot,
        /// Snapshot after the edit.
        after: MessageSnapshot,
    },
}

/// Snapshot is missing a required identity field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidEventError {
    /// No message id.
    #[error("event has no message id")]
    MissingMessageId,
    /// No author, or author without id.
    #[error("event has no author identity")]
    MissingAuthor,
    /// No channel id.
    #[error("event has no channel id")]
    MissingChannel,
}

/// Normalizes a deletion.
pub fn normalize_delete(msg: &MessageSnapshot) -> Result<Option<MutationDraft>, InvalidEventError> {
    let author = msg.author.as_ref().ok_or(InvalidEventError::MissingAuthor)?;
    if author.is_bot || (msg.content.is_empty() && msg.attachments.is_empty()) {
        return Ok(None);
    }

    draft_from(msg, author, Mutation::Delete).map(Some)
}

/// Normalizes an edit. Attachments are taken from `before`.
pub fn normalize_edit(
    before: &MessageSnapshot,
    after: &MessageSnapshot,
) -> Result<Option<MutationDraft>, InvalidEventError> {
    let author = before.author.as_ref().ok_or(InvalidEventError::MissingAuthor)?;
    if author.is_bot || before.content == after.content {
        return Ok(None);
    }

    let mutation = Mutation::Edit {
        content_after: after.content.clone(),
    };
    draft_from(before, author, mutation).map(Some)
}

/// Dispatches on the event variant.
pub fn normalize_event(event: &GatewayEvent) -> Result<Option<MutationDraft>, InvalidEventError> {
    match event {
        GatewayEvent::Deleted(msg) => normalize_delete(msg),
        GatewayEvent::Edited { before, after } => normalize_edit(before, after),
    }
}

fn draft_from(
    msg: &MessageSnapshot,
    author: &AuthorSnapshot,
    mutation: Mutation,
) -> Result<MutationDraft, InvalidEventError> {
    let author_id = author.id.ok_or(InvalidEventError::MissingAuthor)?;
    let message_id = msg.id.ok_or(InvalidEventError::MissingMessageId)?;
    let channel_id = msg.channel_id.ok_or(InvalidEventError::MissingChannel)?;

    Ok(MutationDraft {
        message_id,
        author: AuthorRef {
            id: author_id,
            name: author.name.clone(),
            avatar_url: author.avatar_url.clone(),
        },
        channel_id,
        content_before: msg.content.clone(),
        mutation,
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentRef {
                url: a.url.clone(),
                filename: a.filename.clone(),
                content_type: a.content_type.clone(),
            })
            .collect(),
    })
}
