//! Append-only log of deleted and edited chat messages with ranked per-author lookup.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::MemoryMutationLog`]:
//! ```
//! use mutlog::{
//!     core::store::MemoryMutationLog,
//!     normalize::{normalize_delete, AuthorSnapshot, MessageSnapshot},
//!     persist::Rank,
//! };
//!
//! let msg = MessageSnapshot {
//!     id: Some(10),
//!     author: Some(AuthorSnapshot {
//!         id: Some(1),
//!         name: "ana".to_string(),
//!         avatar_url: None,
//!         is_bot: false,
//!     }),
//!     channel_id: Some(100),
//!     content: "hello".to_string(),
//!     attachments: vec![],
//! };
//!
//! let mut log = MemoryMutationLog::new();
//! let draft = normalize_delete(&msg).expect("valid").expect("not filtered");
//! log.insert(draft);
//! let rec = log.nth_most_recent(1, Rank::FIRST).expect("record");
//! assert_eq!(rec.content_before, "hello");
//! assert_eq!(rec.content_after(), None);
//! ```
//!
//! Runtime usage with the SQLite backend:
//! ```no_run
//! use mutlog::{
//!     persist::sqlite::SqliteMutationLog,
//!     runtime::handle::{spawn_mutation_log, RuntimeConfig},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let log = SqliteMutationLog::open("mutations.db").expect("open sqlite");
//! let handle = spawn_mutation_log(Box::new(log), RuntimeConfig::default());
//! let reply = handle.lookup(1, "ana", 1).await;
//! println!("{reply}");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Logger configuration.
pub mod config;
/// In-memory log, index helpers, and clock.
pub mod core;
/// Gateway snapshot normalization and filtering.
pub mod normalize;
/// Storage abstraction and SQLite implementation.
pub mod persist;
/// Lookup replies for rendering.
pub mod query;
/// Mutation records and drafts.
pub mod record;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;
