use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use spotter::config::ServiceConfig;
use spotter::detection::Detector;
use spotter::engine::{self, OrtEngine};
use spotter::server::{AppState, router};
use spotter::store::InferenceStore;
use spotter::tasks::AnnotationQueue;

#[derive(Parser)]
#[command(name = "spotter")]
#[command(about = "Object detection inference service")]
struct Cli {
    /// Path to the ONNX detection model
    #[arg(long, value_name = "FILE")]
    model: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(long)]
    port: Option<u16>,

    /// Directory for annotated images
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Explicit onnxruntime shared library to load instead of discovery
    #[arg(long, value_name = "FILE")]
    runtime_library: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let mut config = ServiceConfig::from_env();
    if let Some(model) = args.model {
        config.model_path = model;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(runtime_library) = args.runtime_library {
        config.runtime_library = Some(runtime_library);
    }

    // Fatal if the native backend cannot be resolved; no request can
    // succeed without it.
    engine::init_runtime(config.runtime_library.as_deref())?;
    info!(model = %config.model_path.display(), "inference runtime ready");

    let store = Arc::new(InferenceStore::new(config.history_limit));
    let engine = Arc::new(OrtEngine::new(&config.model_path));
    let detector = Arc::new(Detector::new(engine, config.probability_threshold));
    let queue = AnnotationQueue::start(
        Arc::clone(&store),
        config.annotation_workers,
        config.queue_capacity,
    );

    let state = AppState {
        config: config.clone(),
        detector,
        store,
        annotations: queue.sender(),
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server owns the state by now, so its job sender is gone once
    // serve returns and close() can drain the queue and join the workers.
    info!("shutting down, draining annotation queue");
    queue.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to install shutdown signal handler");
    }
}
