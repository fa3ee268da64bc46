//! Status reporting -- tell the origin about each save and each
//! per-peer replication.

use std::sync::Arc;

use mirrorcast_protocol::{file_url, ReplicationStatus, TargetServer};

use crate::bus::{EventBus, Reaction};
use crate::events::Event;
use crate::{Result, Transport};

/// Reaction to both event kinds. Builds a [`ReplicationStatus`] from
/// the event and posts it to the configured origin URL; the response
/// is ignored. Replicated status carries the target peer, saved
/// status does not (no peer is known at save time).
pub struct StatusReporter {
    transport: Arc<dyn Transport>,
    files_url: String,
    origin_url: String,
}

impl StatusReporter {
    pub fn new(
        transport: Arc<dyn Transport>,
        files_url: impl Into<String>,
        origin_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            files_url: files_url.into(),
            origin_url: origin_url.into(),
        }
    }

    fn status_for(&self, event: &Event) -> ReplicationStatus {
        let (target_server, duration, time) = match event {
            Event::Saved(ev) => (None, ev.duration_secs, ev.saved_at),
            Event::Replicated(ev) => (
                Some(TargetServer::from(&ev.peer)),
                ev.duration_secs,
                ev.completed_at,
            ),
        };
        let file = event.file();
        ReplicationStatus {
            source_server: String::new(),
            target_server,
            duration,
            time: time.to_rfc3339(),
            file_url: file_url(&self.files_url, &file.stored_name()),
            origin_file_url: file.origin_url.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Reaction for StatusReporter {
    async fn handle(&self, _bus: &EventBus, event: &Event) -> Result<()> {
        let status = self.status_for(event);
        self.transport.notify(&self.origin_url, &status).await?;
        tracing::debug!(
            origin = %self.origin_url,
            target = status
                .target_server
                .as_ref()
                .map(|t| t.name.as_str())
                .unwrap_or("-"),
            duration = status.duration,
            "status reported"
        );
        Ok(())
    }
}
