//! Mirrorcast Node -- library crate for the file replication node.
//!
//! Re-exports the adapter modules so integration tests and main.rs can
//! wire the pipeline against real HTTP and filesystem collaborators.

pub mod api;
pub mod config;
pub mod peers;
pub mod transport;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirrorcast_pipeline::{
    EventBus, EventKind, Ingestor, PeerDirectory, Pipeline, ReplicateFanOut, StatusReporter,
    Transport,
};
use mirrorcast_storage::{FileStore, LocalFileStore};

use config::NodeConfig;
use peers::JsonPeerDirectory;
use transport::HttpTransport;

/// Wire the full pipeline from its collaborator parts: fan-out and
/// status reporter react to a save (in that order), the reporter alone
/// reacts to each replication.
pub fn pipeline_from_parts(
    transport: Arc<dyn Transport>,
    store: Arc<dyn FileStore>,
    directory: Arc<dyn PeerDirectory>,
    files_url: &str,
    origin_url: &str,
) -> Pipeline {
    let fan_out = Arc::new(ReplicateFanOut::new(
        directory,
        transport.clone(),
        store.clone(),
    ));
    let reporter = Arc::new(StatusReporter::new(transport.clone(), files_url, origin_url));
    let bus = EventBus::builder()
        .register(EventKind::FileSaved, fan_out)
        .register(EventKind::FileSaved, reporter.clone())
        .register(EventKind::FileReplicated, reporter)
        .build();
    Pipeline::new(Ingestor::new(transport, store), bus)
}

/// Build the pipeline and file store from config, with real adapters.
pub fn build_pipeline(cfg: &NodeConfig) -> anyhow::Result<(Pipeline, Arc<dyn FileStore>)> {
    let store: Arc<dyn FileStore> =
        Arc::new(LocalFileStore::open(expand_tilde(&cfg.node.data_dir))?);
    let transport: Arc<dyn Transport> =
        Arc::new(HttpTransport::new(cfg.replication.upload_port));
    let directory: Arc<dyn PeerDirectory> =
        Arc::new(JsonPeerDirectory::new(expand_tilde(&cfg.node.peers_file)));

    let pipeline = pipeline_from_parts(
        transport,
        store.clone(),
        directory,
        &cfg.origin.files_url,
        &cfg.origin.origin_url,
    );
    Ok((pipeline, store))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn load_or_create_token(path: &Path) -> anyhow::Result<String> {
    if path.exists() {
        let token = std::fs::read_to_string(path)?.trim().to_string();
        return Ok(token);
    }

    use rand::Rng;
    let token: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(48)
        .map(char::from)
        .collect();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &token)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::info!(path = %path.display(), "generated bearer token");
    Ok(token)
}
