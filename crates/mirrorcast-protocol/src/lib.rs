//! Mirrorcast Protocol -- domain and wire types.
//!
//! HTTP between servers. Uploads are multipart form fields
//! (content/name/type) on the fixed peer port; status notifications
//! are JSON posted to the origin.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Fixed port peers accept file uploads on.
pub const UPLOAD_PORT: u16 = 8080;

/// Path segment under which saved files are publicly served.
pub const FILES_PATH: &str = "/files/";

/// Fallback file-kind tag when content negotiation yields nothing usable.
pub const BINARY_KIND: &str = "bin";

/// A file persisted to local storage, addressed as `{name}.{kind}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Destination name chosen by the caller (no extension).
    pub name: String,
    /// File-kind tag derived from the download's content type.
    pub kind: String,
    /// Link the file was originally downloaded from.
    pub origin_url: String,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, origin_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            origin_url: origin_url.into(),
        }
    }

    /// Name the file is stored (and publicly served) under.
    pub fn stored_name(&self) -> String {
        format!("{}.{}", self.name, self.kind)
    }
}

/// A replication target server from the peer directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    pub name: String,
    pub ip: String,
    pub zone: String,
}

/// Peer-bound upload payload -- multipart form fields on the wire.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub content: Bytes,
    pub name: String,
    pub kind: String,
}

/// Status payload posted back to the origin after a save or a
/// replication. `target_server` is present only for replication
/// status; no peer is known at save time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationStatus {
    /// Unused by the origin, always empty.
    pub source_server: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_server: Option<TargetServer>,
    /// Whole seconds since the reporting stage began.
    pub duration: u64,
    /// Completion wall time, RFC 3339.
    pub time: String,
    /// Public URL the saved file is served from.
    pub file_url: String,
    /// Link the file was originally downloaded from.
    pub origin_file_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetServer {
    pub name: String,
    pub zone: String,
}

impl From<&Peer> for TargetServer {
    fn from(peer: &Peer) -> Self {
        Self {
            name: peer.name.clone(),
            zone: peer.zone.clone(),
        }
    }
}

/// Build the public serving URL for a stored file.
pub fn file_url(files_url: &str, stored_name: &str) -> String {
    format!("{}{}{}", files_url.trim_end_matches('/'), FILES_PATH, stored_name)
}

/// Derive a file-kind tag from a declared content type.
///
/// Takes the subtype (`application/pdf` -> `pdf`), ignoring any
/// parameters. The generic octet-stream marker and anything
/// unparseable fall back to [`BINARY_KIND`].
pub fn file_kind_from_content_type(content_type: &str) -> String {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match essence.split('/').nth(1).map(str::trim) {
        Some("") | None => BINARY_KIND.into(),
        Some("octet-stream") => BINARY_KIND.into(),
        Some(subtype) => subtype.to_ascii_lowercase(),
    }
}
