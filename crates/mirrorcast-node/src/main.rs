//! Mirrorcast Node -- single binary file replication relay.
//!
//! Usage:
//!   mirrorcast-node                      # Serve the local API
//!   mirrorcast-node --config path.toml   # Run with custom config
//!   mirrorcast-node ingest LINK NAME     # One-shot replication cycle
//!   mirrorcast-node status               # Query the running node

use std::sync::Arc;

use clap::{Parser, Subcommand};

use mirrorcast_node::api::{self, AppState};
use mirrorcast_node::config::NodeConfig;
use mirrorcast_node::{build_pipeline, expand_tilde, load_or_create_token};

#[derive(Parser)]
#[command(name = "mirrorcast-node", about = "Mirrorcast file replication node")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "~/.mirrorcast/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the local API (default)
    Run,
    /// Download a file and replicate it to all peers, without the API
    Ingest {
        /// Download link at the origin
        link: String,
        /// Destination name (extension-less)
        name: String,
    },
    /// Show node status (queries the local API)
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "mirrorcast_node=info,mirrorcast_pipeline=info,mirrorcast_storage=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let mut cfg = NodeConfig::load_or_default(&config_path)?;
    cfg.apply_env();

    match cli.command {
        Some(Commands::Ingest { link, name }) => {
            let (pipeline, _store) = build_pipeline(&cfg)?;
            let file = pipeline.run_cycle(&link, &name).await?;
            println!("stored {}", file.stored_name());
        }
        Some(Commands::Status) => {
            cli_api_call(&cfg, "/api/v1/status", "{}").await?;
        }
        Some(Commands::Run) | None => {
            run_node(cfg).await?;
        }
    }

    Ok(())
}

/// Make a POST request to the local node API and print the JSON response.
async fn cli_api_call(cfg: &NodeConfig, path: &str, body: &str) -> anyhow::Result<()> {
    let url = format!("http://{}{}", cfg.node.api_addr, path);

    let token_path = expand_tilde("~/.mirrorcast/node-token");
    let token = if token_path.exists() {
        std::fs::read_to_string(&token_path)?.trim().to_string()
    } else {
        String::new()
    };

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(body.to_string())
        .send()
        .await?;

    let status = resp.status();
    let text = resp.text().await?;

    if status.is_success() {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{}", text);
        }
    } else {
        eprintln!("Error ({}): {}", status, text);
        std::process::exit(1);
    }
    Ok(())
}

async fn run_node(cfg: NodeConfig) -> anyhow::Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %cfg.node.data_dir,
        peers_file = %cfg.node.peers_file,
        files_url = %cfg.origin.files_url,
        origin_url = %cfg.origin.origin_url,
        upload_port = cfg.replication.upload_port,
        "starting mirrorcast-node"
    );

    let (pipeline, store) = build_pipeline(&cfg)?;

    let token_path = expand_tilde("~/.mirrorcast/node-token");
    let bearer_token = load_or_create_token(&token_path)?;

    let state = Arc::new(AppState {
        pipeline,
        store,
        bearer_token,
        start_time: std::time::Instant::now(),
    });
    let router = api::router(state);

    let addr = cfg.node.api_addr.as_str();
    tracing::info!(addr, "API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}
