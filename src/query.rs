//! Lookup outcomes handed to the reply renderer.

use std::fmt;

use crate::{
    persist::Rank,
    record::MutationRecord,
    types::AuthorId,
};

/// Result of a ranked lookup, shaped for user-facing rendering.
///
/// `Failed` deliberately carries no error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupReply {
    /// A record exists at the requested rank.
    Found {
        /// The record.
        record: MutationRecord,
        /// Rank that was requested, after clamping.
        rank: Rank,
    },
    /// The author has fewer than `rank` records.
    NotFound {
        /// Author that was queried.
        author_id: AuthorId,
        /// Name the author is shown under.
        display_name: String,
        /// Rank that was requested, after clamping.
        rank: Rank,
    },
    /// Storage could not answer.
    Failed,
}

impl LookupReply {
    /// The record, when one was found.
    pub fn record(&self) -> Option<&MutationRecord> {
        match self {
            Self::Found { record, .. } => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for LookupReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { record, rank } => {
                match record.content_after() {
                    Some(after) => {
                        writeln!(f, "Edited message by {}", record.author.name)?;
                        writeln!(f, "Before: {}", record.content_before)?;
                        writeln!(f, "After: {after}")?;
                    }
                    None => {
                        writeln!(f, "Deleted message by {}", record.author.name)?;
                        writeln!(f, "Content: {}", record.content_before)?;
                    }
                }
                for attachment in &record.attachments {
                    writeln!(f, "Attachment: {} ({})", attachment.filename, attachment.url)?;
                }
                write!(
                    f,
                    "In channel {} • #{} most recent • {}",
                    record.channel_id,
                    rank.get(),
                    record.created_at.to_rfc3339()
                )
            }
            Self::NotFound {
                display_name, rank, ..
            } => write!(
                f,
                "No deleted or edited message #{} found for {display_name}.",
                rank.get()
            ),
            Self::Failed => write!(f, "Something went wrong while retrieving the message log."),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::record::{AttachmentRef, AuthorRef, Mutation};

    fn record(mutation: Mutation) -> MutationRecord {
        MutationRecord {
            id: 7,
            created_at: DateTime::from_timestamp(0, 0).expect("epoch"),
            message_id: 1,
            author: AuthorRef {
                id: 9,
                name: "ana".to_string(),
                avatar_url: None,
            },
            channel_id: 42,
            content_before: "foo".to_string(),
            mutation,
            attachments: vec![AttachmentRef {
                url: "https://cdn.example/cat.png".to_string(),
                filename: "cat.png".to_string(),
                content_type: Some("image/png".to_string()),
            }],
        }
    }

    #[test]
    fn edit_shows_before_and_after() {
        let reply = LookupReply::Found {
            record: record(Mutation::Edit {
                content_after: "bar".to_string(),
            }),
            rank: Rank::clamped(2),
        };
        let text = reply.to_string();
        assert!(text.starts_with("Edited message by ana"));
        assert!(text.contains("Before: foo"));
        assert!(text.contains("After: bar"));
        assert!(text.contains("Attachment: cat.png (https://cdn.example/cat.png)"));
        assert!(text.contains("#2 most recent"));
    }

    #[test]
    fn delete_shows_content_only() {
        let reply = LookupReply::Found {
            record: record(Mutation::Delete),
            rank: Rank::FIRST,
        };
        let text = reply.to_string();
        assert!(text.starts_with("Deleted message by ana"));
        assert!(text.contains("Content: foo"));
        assert!(!text.contains("After:"));
    }

    #[test]
    fn not_found_and_failed_are_distinct() {
        let missing = LookupReply::NotFound {
            author_id: 9,
            display_name: "ana".to_string(),
            rank: Rank::clamped(3),
        };
        assert_eq!(missing.to_string(), "No deleted or edited message #3 found for ana.");
        assert_ne!(LookupReply::Failed.to_string(), missing.to_string());
        assert!(LookupReply::Failed.record().is_none());
    }
}
