use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, broadcast, mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::{
    normalize::{GatewayEvent, normalize_event},
    persist::{MutationLog, Rank, StorageError},
    query::LookupReply,
    record::{MutationDraft, MutationRecord},
    types::{AuthorId, RecordId},
};

use super::events::LogEvent;

/// Failure of a runtime request.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The runtime task has stopped.
    #[error("mutation log runtime is gone")]
    ChannelClosed,
}

/// Queue sizing for [`spawn_mutation_log`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Bound of the command queue; full queues make submitters wait.
    pub queue_bound: usize,
    /// Per-subscriber backlog of the [`LogEvent`] broadcast.
    pub events_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            queue_bound: 256,
            events_capacity: 1024,
        }
    }
}

/// What [`MutationLogHandle::submit`] did with a gateway event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Normalized and queued for append.
    Queued,
    /// Dropped by the normalizer's filtering policy.
    Filtered,
    /// Dropped because a required identity field was missing.
    Rejected,
}

/// Cloneable handle to the runtime; every clone talks to the same log.
#[derive(Clone)]
pub struct MutationLogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LogEvent>,
}

type SharedLog = Arc<Mutex<Box<dyn MutationLog>>>;

enum Command {
    Append {
        draft: MutationDraft,
        resp: Option<oneshot::Sender<Result<RecordId, StorageError>>>,
    },
    FindNth {
        author: AuthorId,
        rank: Rank,
        resp: oneshot::Sender<Result<Option<MutationRecord>, StorageError>>,
    },
    Flush {
        resp: oneshot::Sender<Result<(), StorageError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), StorageError>>,
    },
}

/// Starts the single task that owns `log` and serves every handle.
pub fn spawn_mutation_log(log: Box<dyn MutationLog>, config: RuntimeConfig) -> MutationLogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<LogEvent>(config.events_capacity.max(1));

    let events_tx_loop = events_tx.clone();
    let log: SharedLog = Arc::new(Mutex::new(log));

    tokio::spawn(async move {
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &log, &events_tx_loop).await {
                break;
            }
        }
        debug!("mutation log runtime stopped");
    });

    MutationLogHandle { cmd_tx, events_tx }
}

impl MutationLogHandle {
    /// Subscribes to runtime events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events_tx.subscribe()
    }

    /// Appends a draft and waits for the storage acknowledgment.
    pub async fn append(&self, draft: MutationDraft) -> Result<RecordId, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Append {
                draft,
                resp: Some(tx),
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// Normalizes a gateway event and queues the append without waiting for it.
    ///
    /// Append failures after queueing are logged and broadcast as
    /// [`LogEvent::AppendFailed`]; they are not retried.
    pub async fn submit(&self, event: GatewayEvent) -> Result<SubmitOutcome, RuntimeError> {
        let draft = match normalize_event(&event) {
            Ok(Some(draft)) => draft,
            Ok(None) => return Ok(SubmitOutcome::Filtered),
            Err(err) => {
                warn!(error = %err, "dropping malformed mutation event");
                return Ok(SubmitOutcome::Rejected);
            }
        };

        self.cmd_tx
            .send(Command::Append { draft, resp: None })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(SubmitOutcome::Queued)
    }

    /// Returns the `n`th most recent record of `author`; `n < 1` is treated as 1.
    pub async fn find_nth_most_recent(
        &self,
        author: AuthorId,
        n: i64,
    ) -> Result<Option<MutationRecord>, RuntimeError> {
        self.find_ranked(author, Rank::clamped(n)).await
    }

    /// Like [`Self::find_nth_most_recent`], folded into a renderable reply.
    ///
    /// `display_name` is the queried member's current name, shown when nothing is found.
    pub async fn lookup(&self, author: AuthorId, display_name: &str, n: i64) -> LookupReply {
        let rank = Rank::clamped(n);
        match self.find_ranked(author, rank).await {
            Ok(Some(record)) => LookupReply::Found { record, rank },
            Ok(None) => LookupReply::NotFound {
                author_id: author,
                display_name: display_name.to_string(),
                rank,
            },
            Err(err) => {
                error!(author_id = author, rank = rank.get(), error = %err, "mutation lookup failed");
                LookupReply::Failed
            }
        }
    }

    /// Waits for every command queued before it, then flushes the backend.
    pub async fn flush(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Flush { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// Drains queued commands, flushes, and stops the runtime.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Shutdown { resp: tx })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    async fn find_ranked(
        &self,
        author: AuthorId,
        rank: Rank,
    ) -> Result<Option<MutationRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::FindNth {
                author,
                rank,
                resp: tx,
            })
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }
}

async fn handle_command(
    cmd: Command,
    log: &SharedLog,
    events_tx: &broadcast::Sender<LogEvent>,
) -> bool {
    match cmd {
        Command::Append { draft, resp } => {
            let message_id = draft.message_id;
            let author_id = draft.author.id;
            let kind = draft.mutation.kind();

            let res = run_blocking(log, move |log| log.append(draft)).await;
            match &res {
                Ok(id) => {
                    debug!(record_id = id, message_id, author_id, ?kind, "mutation appended");
                    let _ = events_tx.send(LogEvent::Appended {
                        id: *id,
                        author_id,
                        kind,
                    });
                }
                Err(err) => {
                    error!(message_id, author_id, error = %err, "mutation append failed");
                    let _ = events_tx.send(LogEvent::AppendFailed { message_id });
                }
            }
            if let Some(resp) = resp {
                let _ = resp.send(res);
            }
        }
        Command::FindNth { author, rank, resp } => {
            if resp.is_closed() {
                return false;
            }
            let res = run_blocking(log, move |log| log.find_nth_most_recent(author, rank)).await;
            let _ = resp.send(res);
        }
        Command::Flush { resp } => {
            let _ = resp.send(run_blocking(log, |log| log.flush()).await);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(run_blocking(log, |log| log.flush()).await);
            return true;
        }
    }

    false
}

async fn run_blocking<T, F>(log: &SharedLog, f: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn MutationLog) -> Result<T, StorageError> + Send + 'static,
{
    let log = Arc::clone(log);
    tokio::task::spawn_blocking(move || {
        let mut log = log.blocking_lock();
        f(&mut **log)
    })
    .await
    .map_err(|e| StorageError::Worker(format!("join error: {e}")))?
}
