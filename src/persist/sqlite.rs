//! SQLite-backed append-only mutation log.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::{
    core::clock::{Clock, MonotonicStamper, SystemClock},
    record::{AttachmentRef, AuthorRef, Mutation, MutationDraft, MutationRecord},
    types::{AuthorId, MutationKind, RecordId},
};

use super::{MutationLog, Rank, StorageError, StorageResult};

/// Version number for serialized attachment payloads.
pub const ATTACHMENTS_FORMAT_VERSION: u16 = 1;

const SELECT_COLUMNS: &str = "id, created_at_us, message_id, author_id, author_name, author_avatar_url, \
     channel_id, kind, content_before, content_after, attachments";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AttachmentsEnvelope {
    format_version: u16,
    attachments: Vec<AttachmentRef>,
}

/// SQLite implementation of [`MutationLog`].
pub struct SqliteMutationLog {
    conn: Connection,
    stamper: MonotonicStamper,
}

impl SqliteMutationLog {
    /// Opens or creates a log at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_clock(path, Arc::new(SystemClock))
    }

    /// Opens or creates a log at `path` stamping records with `clock`.
    pub fn open_with_clock(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn, clock)
    }

    /// Opens an in-memory log.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn, Arc::new(SystemClock))
    }

    fn init_connection(conn: Connection, clock: Arc<dyn Clock>) -> StorageResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let mut stamper = MonotonicStamper::new(clock);
        let latest: Option<i64> = conn
            .query_row("SELECT MAX(created_at_us) FROM mutation_log", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()?
            .flatten();
        if let Some(us) = latest {
            stamper.seed(micros_to_utc(us)?);
        }

        Ok(Self { conn, stamper })
    }

    /// Total number of persisted records.
    pub fn len(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM mutation_log", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Returns true when nothing has been appended.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Loads one record by id.
    pub fn get(&self, id: RecordId) -> StorageResult<Option<MutationRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM mutation_log WHERE id = ?1");
        let raw = self
            .conn
            .query_row(&sql, params![id as i64], RawRow::read)
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }
}

impl MutationLog for SqliteMutationLog {
    fn append(&mut self, draft: MutationDraft) -> StorageResult<RecordId> {
        let created_at = self.stamper.stamp();
        let attachments = serde_json::to_vec(&AttachmentsEnvelope {
            format_version: ATTACHMENTS_FORMAT_VERSION,
            attachments: draft.attachments,
        })?;

        self.conn.execute(
            "INSERT INTO mutation_log(created_at_us, message_id, author_id, author_name, author_avatar_url, \
             channel_id, kind, content_before, content_after, attachments) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                created_at.timestamp_micros(),
                draft.message_id as i64,
                draft.author.id as i64,
                draft.author.name,
                draft.author.avatar_url,
                draft.channel_id as i64,
                draft.mutation.kind().code(),
                draft.content_before,
                draft.mutation.content_after(),
                attachments,
            ],
        )?;

        Ok(self.conn.last_insert_rowid() as RecordId)
    }

    fn find_nth_most_recent(&self, author: AuthorId, rank: Rank) -> StorageResult<Option<MutationRecord>> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM mutation_log WHERE author_id = ?1 \
             ORDER BY created_at_us DESC, id DESC LIMIT 1 OFFSET ?2"
        );
        let offset = i64::try_from(rank.offset()).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let raw = stmt
            .query_row(params![author as i64, offset], RawRow::read)
            .optional()?;
        raw.map(RawRow::into_record).transpose()
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}

/// Column values as stored, before domain validation.
struct RawRow {
    id: i64,
    created_at_us: i64,
    message_id: i64,
    author_id: i64,
    author_name: String,
    author_avatar_url: Option<String>,
    channel_id: i64,
    kind: i64,
    content_before: String,
    content_after: Option<String>,
    attachments: Vec<u8>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            created_at_us: row.get(1)?,
            message_id: row.get(2)?,
            author_id: row.get(3)?,
            author_name: row.get(4)?,
            author_avatar_url: row.get(5)?,
            channel_id: row.get(6)?,
            kind: row.get(7)?,
            content_before: row.get(8)?,
            content_after: row.get(9)?,
            attachments: row.get(10)?,
        })
    }

    fn into_record(self) -> StorageResult<MutationRecord> {
        let kind = MutationKind::from_code(self.kind)
            .ok_or_else(|| StorageError::Corrupt(format!("record {}: unknown kind {}", self.id, self.kind)))?;
        let mutation = match (kind, self.content_after) {
            (MutationKind::Delete, None) => Mutation::Delete,
            (MutationKind::Edit, Some(content_after)) => Mutation::Edit { content_after },
            (kind, _) => {
                return Err(StorageError::Corrupt(format!(
                    "record {}: content_after does not match kind {kind:?}",
                    self.id
                )));
            }
        };

        Ok(MutationRecord {
            id: self.id as RecordId,
            created_at: micros_to_utc(self.created_at_us)?,
            message_id: self.message_id as u64,
            author: AuthorRef {
                id: self.author_id as u64,
                name: self.author_name,
                avatar_url: self.author_avatar_url,
            },
            channel_id: self.channel_id as u64,
            content_before: self.content_before,
            mutation,
            attachments: decode_attachments(&self.attachments)?,
        })
    }
}

fn micros_to_utc(us: i64) -> StorageResult<DateTime<Utc>> {
    DateTime::from_timestamp_micros(us)
        .ok_or_else(|| StorageError::Corrupt(format!("timestamp out of range: {us}")))
}

fn decode_attachments(payload: &[u8]) -> StorageResult<Vec<AttachmentRef>> {
    let envelope: AttachmentsEnvelope = serde_json::from_slice(payload)?;
    if envelope.format_version != ATTACHMENTS_FORMAT_VERSION {
        return Err(StorageError::Corrupt(format!(
            "unsupported attachments format version: {}",
            envelope.format_version
        )));
    }
    Ok(envelope.attachments)
}
