//! Replication fan-out -- push a saved file to every peer concurrently
//! and publish a replicated event per completion, in completion order.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use mirrorcast_protocol::UploadPayload;
use mirrorcast_storage::FileStore;
use tokio::task::JoinSet;

use crate::bus::{EventBus, Reaction};
use crate::events::{Event, FileReplicatedEvent};
use crate::{PeerDirectory, Result, Transport};

/// Reaction to [`Event::Saved`].
///
/// Failure policy: skip. A failed peer upload is logged at warn and
/// produces no replicated event; the remaining completions proceed.
/// Every peer therefore ends success-reported or explicitly failed.
pub struct ReplicateFanOut {
    directory: Arc<dyn PeerDirectory>,
    transport: Arc<dyn Transport>,
    store: Arc<dyn FileStore>,
}

impl ReplicateFanOut {
    pub fn new(
        directory: Arc<dyn PeerDirectory>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            directory,
            transport,
            store,
        }
    }
}

#[async_trait::async_trait]
impl Reaction for ReplicateFanOut {
    async fn handle(&self, bus: &EventBus, event: &Event) -> Result<()> {
        let Event::Saved(saved) = event else {
            return Ok(());
        };
        let file = &saved.file;
        let stored_name = file.stored_name();

        // Peers are resolved fresh every cycle; a directory failure is
        // fatal to the fan-out.
        let peers = self.directory.list_peers().await?;
        if peers.is_empty() {
            tracing::info!(stored_name = %stored_name, "no peers, nothing to replicate");
            return Ok(());
        }

        // The ingestion stream is single-pass and cannot be reused, so
        // read the stored content once into an immutable block shared
        // by every upload.
        let content = self.store.read(&stored_name).await?;

        let peer_count = peers.len();
        let mut uploads = JoinSet::new();
        for peer in peers {
            let transport = Arc::clone(&self.transport);
            let payload = UploadPayload {
                content: content.clone(),
                name: file.name.clone(),
                kind: file.kind.clone(),
            };
            uploads.spawn(async move {
                let result = transport.upload(&peer, payload).await;
                (peer, result)
            });
        }
        tracing::debug!(stored_name = %stored_name, peer_count, "fan-out started");

        // One fixed reference point for every duration in this cycle;
        // later completions report larger values by construction.
        let cycle_start = Instant::now();
        let mut replicated = 0usize;
        let mut failed = 0usize;
        while let Some(joined) = uploads.join_next().await {
            let (peer, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!(error = %e, "upload task aborted");
                    failed += 1;
                    continue;
                }
            };
            match outcome {
                Ok(status) => {
                    tracing::debug!(peer = %peer.name, status, "upload complete");
                    let replicated_event = FileReplicatedEvent {
                        file: file.clone(),
                        peer,
                        duration_secs: cycle_start.elapsed().as_secs(),
                        completed_at: Utc::now(),
                    };
                    bus.publish(&Event::Replicated(replicated_event)).await?;
                    replicated += 1;
                }
                Err(e) => {
                    tracing::warn!(peer = %peer.name, error = %e, "upload failed, peer skipped");
                    failed += 1;
                }
            }
        }

        tracing::info!(stored_name = %stored_name, replicated, failed, "fan-out complete");
        Ok(())
    }
}
