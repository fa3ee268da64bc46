//! File ingestion -- streams a download straight into the file store.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use mirrorcast_protocol::{file_kind_from_content_type, FileDescriptor};
use mirrorcast_storage::FileStore;

use crate::events::FileSavedEvent;
use crate::{Result, Transport};

pub struct Ingestor {
    transport: Arc<dyn Transport>,
    store: Arc<dyn FileStore>,
}

impl Ingestor {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn FileStore>) -> Self {
        Self { transport, store }
    }

    /// Download `link` and store it under `{name}.{kind}`, where the
    /// kind tag comes from the response's declared content type.
    ///
    /// The body is streamed chunk-by-chunk; it is never buffered whole.
    /// If the write fails partway the partial file is removed and the
    /// whole operation fails -- zero files on failure, no retry.
    pub async fn ingest(&self, link: &str, name: &str) -> Result<FileSavedEvent> {
        let started = Instant::now();

        let download = self.transport.download(link).await?;
        let kind = file_kind_from_content_type(&download.content_type);
        let file = FileDescriptor::new(name, kind, link);
        let stored_name = file.stored_name();

        match self.store.write_stream(&stored_name, download.stream).await {
            Ok(written) => {
                tracing::info!(
                    stored_name = %stored_name,
                    written,
                    origin = link,
                    "file ingested"
                );
            }
            Err(e) => {
                // Best effort: a failed write must not leave the name
                // addressable as a complete file.
                if let Err(cleanup) = self.store.remove(&stored_name).await {
                    tracing::debug!(
                        stored_name = %stored_name,
                        error = %cleanup,
                        "partial file cleanup failed"
                    );
                }
                return Err(e.into());
            }
        }

        Ok(FileSavedEvent {
            file,
            duration_secs: started.elapsed().as_secs(),
            saved_at: Utc::now(),
        })
    }
}
