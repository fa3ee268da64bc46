//! Configuration types for mirrorcast-node.
//! Parsed from ~/.mirrorcast/config.toml; FILES_URL and ORIGIN_URL
//! environment variables override the [origin] section.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,
    #[serde(default)]
    pub origin: OriginSection,
    #[serde(default)]
    pub replication: ReplicationSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSection {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_peers_file")]
    pub peers_file: String,
    #[serde(default = "default_api_addr")]
    pub api_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginSection {
    /// Public base URL saved files are served from; joined with
    /// /files/{stored_name} in status payloads.
    #[serde(default = "default_files_url")]
    pub files_url: String,
    /// Destination for status notifications.
    #[serde(default = "default_origin_url")]
    pub origin_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationSection {
    /// Port peers accept uploads on.
    #[serde(default = "default_upload_port")]
    pub upload_port: u16,
}

fn default_data_dir() -> String {
    "~/.mirrorcast/files".into()
}
fn default_peers_file() -> String {
    "~/.mirrorcast/servers.json".into()
}
fn default_api_addr() -> String {
    "127.0.0.1:9470".into()
}
fn default_files_url() -> String {
    "http://127.0.0.1:8000".into()
}
fn default_origin_url() -> String {
    "http://127.0.0.1:8000/status".into()
}
fn default_upload_port() -> u16 {
    mirrorcast_protocol::UPLOAD_PORT
}

impl Default for NodeSection {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            peers_file: default_peers_file(),
            api_addr: default_api_addr(),
        }
    }
}

impl Default for OriginSection {
    fn default() -> Self {
        Self {
            files_url: default_files_url(),
            origin_url: default_origin_url(),
        }
    }
}

impl Default for ReplicationSection {
    fn default() -> Self {
        Self {
            upload_port: default_upload_port(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node: NodeSection::default(),
            origin: OriginSection::default(),
            replication: ReplicationSection::default(),
        }
    }
}

impl NodeConfig {
    /// Load config from file, or create default if missing.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: NodeConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// FILES_URL and ORIGIN_URL environment variables take precedence
    /// over the [origin] section.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("FILES_URL") {
            self.origin.files_url = v;
        }
        if let Ok(v) = std::env::var("ORIGIN_URL") {
            self.origin.origin_url = v;
        }
    }
}
