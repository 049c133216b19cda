use tokio::sync::mpsc;
use tracing::debug;

use crate::normalize::GatewayEvent;

use super::handle::{MutationLogHandle, RuntimeError, SubmitOutcome};

/// Counters for one [`pump_events`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Events normalized and queued for append.
    pub queued: u64,
    /// Events dropped by filtering policy.
    pub filtered: u64,
    /// Events dropped as malformed.
    pub rejected: u64,
}

/// Drains gateway events into the log until the gateway side closes the channel.
///
/// Returns early with [`RuntimeError::ChannelClosed`] if the runtime stops first.
pub async fn pump_events(
    mut rx: mpsc::Receiver<GatewayEvent>,
    handle: MutationLogHandle,
) -> Result<IngestStats, RuntimeError> {
    let mut stats = IngestStats::default();
    while let Some(event) = rx.recv().await {
        match handle.submit(event).await? {
            SubmitOutcome::Queued => stats.queued += 1,
            SubmitOutcome::Filtered => stats.filtered += 1,
            SubmitOutcome::Rejected => stats.rejected += 1,
        }
    }
    debug!(?stats, "gateway channel closed");
    Ok(stats)
}
