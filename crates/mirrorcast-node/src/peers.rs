//! Peer directory backed by a static JSON file.
//!
//! The file is an array of {name, ip, zone} objects and is re-read on
//! every call, so edits take effect on the next replication cycle.

use std::path::PathBuf;

use mirrorcast_pipeline::{DirectoryError, PeerDirectory};
use mirrorcast_protocol::Peer;

pub struct JsonPeerDirectory {
    path: PathBuf,
}

impl JsonPeerDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl PeerDirectory for JsonPeerDirectory {
    async fn list_peers(&self) -> Result<Vec<Peer>, DirectoryError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let peers: Vec<Peer> = serde_json::from_str(&raw)?;
        tracing::debug!(
            count = peers.len(),
            path = %self.path.display(),
            "peer list loaded"
        );
        Ok(peers)
    }
}
