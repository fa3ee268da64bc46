//! Test harness for in-process node integration tests.
//!
//! Spins three real HTTP listeners on ephemeral ports: a source
//! serving the file to ingest, a peer endpoint capturing uploads, and
//! an origin capturing status notifications. The pipeline is wired
//! with the real reqwest transport, a tempdir-backed file store, and a
//! servers.json peer directory, exactly as main.rs wires it.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;

use mirrorcast_node::api::{self, AppState};
use mirrorcast_node::peers::JsonPeerDirectory;
use mirrorcast_node::pipeline_from_parts;
use mirrorcast_node::transport::HttpTransport;
use mirrorcast_pipeline::Pipeline;
use mirrorcast_storage::{FileStore, LocalFileStore};

pub struct Harness {
    pub pipeline: Pipeline,
    pub store: Arc<dyn FileStore>,
    /// GET {source_url} serves the configured file body.
    pub source_url: String,
    /// Raw multipart bodies received by the peer endpoint.
    pub uploads: Arc<Mutex<Vec<Vec<u8>>>>,
    /// JSON payloads received by the origin, in arrival order.
    pub notifications: Arc<Mutex<Vec<serde_json::Value>>>,
    pub files_url: String,
    data_dir: tempfile::TempDir,
    _peers_dir: tempfile::TempDir,
}

#[derive(Clone)]
struct SourceFile {
    content_type: String,
    body: Vec<u8>,
}

async fn serve_source(State(file): State<SourceFile>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, file.content_type.clone())],
        file.body.clone(),
    )
}

async fn record_upload(
    State(log): State<Arc<Mutex<Vec<Vec<u8>>>>>,
    body: Bytes,
) -> StatusCode {
    log.lock().unwrap().push(body.to_vec());
    StatusCode::OK
}

async fn record_notification(
    State(log): State<Arc<Mutex<Vec<serde_json::Value>>>>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    log.lock().unwrap().push(payload);
    StatusCode::OK
}

async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

impl Harness {
    /// Start source/peer/origin listeners and wire a pipeline with
    /// `peer_names` all pointing at the capturing peer endpoint.
    pub async fn start(content_type: &str, body: &[u8], peer_names: &[&str]) -> Self {
        let uploads: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let notifications: Arc<Mutex<Vec<serde_json::Value>>> = Arc::new(Mutex::new(Vec::new()));

        let source_addr = spawn_server(
            Router::new()
                .route("/file", get(serve_source))
                .route(
                    "/gone",
                    get(|| async { StatusCode::NOT_FOUND }),
                )
                .with_state(SourceFile {
                    content_type: content_type.to_string(),
                    body: body.to_vec(),
                }),
        )
        .await;

        let peer_addr = spawn_server(
            Router::new()
                .route("/", post(record_upload))
                .with_state(uploads.clone()),
        )
        .await;

        let origin_addr = spawn_server(
            Router::new()
                .route("/hook", post(record_notification))
                .with_state(notifications.clone()),
        )
        .await;

        let data_dir = tempfile::tempdir().unwrap();
        let peers_dir = tempfile::tempdir().unwrap();
        let peers_file = peers_dir.path().join("servers.json");
        let peer_list: Vec<serde_json::Value> = peer_names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                serde_json::json!({
                    "name": name,
                    "ip": "127.0.0.1",
                    "zone": format!("zone-{i}"),
                })
            })
            .collect();
        std::fs::write(&peers_file, serde_json::to_string(&peer_list).unwrap()).unwrap();

        let store: Arc<dyn FileStore> =
            Arc::new(LocalFileStore::open(data_dir.path()).unwrap());
        let files_url = "http://files.example.test".to_string();
        let pipeline = pipeline_from_parts(
            Arc::new(HttpTransport::new(peer_addr.port())),
            store.clone(),
            Arc::new(JsonPeerDirectory::new(&peers_file)),
            &files_url,
            &format!("http://{origin_addr}/hook"),
        );

        Self {
            pipeline,
            store,
            source_url: format!("http://{source_addr}"),
            uploads,
            notifications,
            files_url,
            data_dir,
            _peers_dir: peers_dir,
        }
    }

    pub fn stored_file_count(&self) -> usize {
        std::fs::read_dir(self.data_dir.path()).unwrap().count()
    }

    /// Put the wired pipeline behind the node API router on an
    /// ephemeral TCP port, guarded by `token`.
    pub async fn into_api(self, token: &str) -> ApiHarness {
        let state = Arc::new(AppState {
            pipeline: self.pipeline,
            store: self.store,
            bearer_token: token.to_string(),
            start_time: std::time::Instant::now(),
        });
        let addr = spawn_server(api::router(state)).await;
        ApiHarness {
            api_url: format!("http://{addr}"),
            token: token.to_string(),
            source_url: self.source_url,
            uploads: self.uploads,
            notifications: self.notifications,
            _data_dir: self.data_dir,
            _peers_dir: self._peers_dir,
        }
    }
}

/// A [`Harness`] served through the node API instead of called
/// directly. Tests talk to it the way the CLI does, over HTTP with a
/// bearer token.
pub struct ApiHarness {
    pub api_url: String,
    pub token: String,
    pub source_url: String,
    pub uploads: Arc<Mutex<Vec<Vec<u8>>>>,
    pub notifications: Arc<Mutex<Vec<serde_json::Value>>>,
    _data_dir: tempfile::TempDir,
    _peers_dir: tempfile::TempDir,
}
