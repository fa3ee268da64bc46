//! Mirrorcast Pipeline -- the event-driven replication core.
//!
//! One cycle per file: ingestion streams a download into the file
//! store and publishes a saved event; the fan-out reaction pushes the
//! stored content to every peer concurrently and publishes a
//! replicated event per completion; the status reporter posts a
//! notification to the origin for the save and for each replication.
//!
//! External collaborators (HTTP transport, peer directory, file store)
//! are reached through the traits in this module so the core stays
//! testable with in-process doubles.

use mirrorcast_protocol::{FileDescriptor, Peer, ReplicationStatus, UploadPayload};
use mirrorcast_storage::ByteStream;

pub mod bus;
pub mod events;
pub mod fanout;
pub mod ingest;
pub mod status;

pub use bus::{EventBus, EventBusBuilder, Reaction};
pub use events::{Event, EventKind, FileReplicatedEvent, FileSavedEvent};
pub use fanout::ReplicateFanOut;
pub use ingest::Ingestor;
pub use status::StatusReporter;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("storage error: {0}")]
    Storage(#[from] mirrorcast_storage::StorageError),
    #[error("peer directory error: {0}")]
    Directory(#[from] DirectoryError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed peer list: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// An open streaming download: declared content type plus the body as
/// a single-pass chunk stream.
pub struct Download {
    pub content_type: String,
    pub stream: ByteStream,
}

/// Outbound request/response seam: downloads from the origin, uploads
/// to peers, status notifications back to the origin.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn download(&self, link: &str) -> std::result::Result<Download, TransportError>;

    /// Push file content to one peer. Returns the peer's response
    /// status code; a transport failure is an error, a non-2xx status
    /// is the peer's answer and is reported as-is.
    async fn upload(
        &self,
        peer: &Peer,
        payload: UploadPayload,
    ) -> std::result::Result<u16, TransportError>;

    /// Post a status payload; the response body is ignored.
    async fn notify(
        &self,
        url: &str,
        status: &ReplicationStatus,
    ) -> std::result::Result<(), TransportError>;
}

/// Resolves the current replication targets. Resolved fresh every
/// cycle; never cached by the core.
#[async_trait::async_trait]
pub trait PeerDirectory: Send + Sync {
    async fn list_peers(&self) -> std::result::Result<Vec<Peer>, DirectoryError>;
}

/// One file's end-to-end cycle: ingest, then publish the saved event.
/// Everything downstream (fan-out, per-peer replicated events, status
/// notifications) runs inside `publish` before this returns.
pub struct Pipeline {
    ingestor: Ingestor,
    bus: EventBus,
}

impl Pipeline {
    pub fn new(ingestor: Ingestor, bus: EventBus) -> Self {
        Self { ingestor, bus }
    }

    pub async fn run_cycle(&self, link: &str, name: &str) -> Result<FileDescriptor> {
        let saved = self.ingestor.ingest(link, name).await?;
        let file = saved.file.clone();
        self.bus.publish(&Event::Saved(saved)).await?;
        Ok(file)
    }
}
