//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration, resolved from environment variables with CLI
/// overrides applied on top.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Path to the ONNX detection model.
    pub model_path: PathBuf,
    /// Directory annotated images are written under.
    pub output_dir: PathBuf,
    /// Candidates at or below this confidence are discarded.
    pub probability_threshold: f32,
    /// Number of background annotation workers.
    pub annotation_workers: usize,
    /// Annotation queue capacity before submitters block.
    pub queue_capacity: usize,
    /// Optional cap on the inference history; unbounded when absent.
    pub history_limit: Option<usize>,
    /// Deadline for one model call. The request fails past it; the
    /// underlying computation is not preemptible and runs to completion.
    pub detect_timeout: Duration,
    /// Max accepted request body size in bytes.
    pub max_body_size: usize,
    /// Explicit onnxruntime shared-library location, skipping discovery.
    pub runtime_library: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            model_path: PathBuf::from("yolov8m.onnx"),
            output_dir: PathBuf::from("annotated"),
            probability_threshold: 0.5,
            annotation_workers: 2,
            queue_capacity: 32,
            history_limit: None,
            detect_timeout: Duration::from_secs(30),
            max_body_size: 20 * 1024 * 1024,
            runtime_library: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_var("SPOTTER_HOST").unwrap_or(defaults.host),
            port: parsed_env("SPOTTER_PORT").unwrap_or(defaults.port),
            model_path: env_var("SPOTTER_MODEL")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            output_dir: env_var("SPOTTER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            probability_threshold: parsed_env("SPOTTER_THRESHOLD")
                .unwrap_or(defaults.probability_threshold),
            annotation_workers: parsed_env("SPOTTER_ANNOTATION_WORKERS")
                .unwrap_or(defaults.annotation_workers),
            queue_capacity: parsed_env("SPOTTER_QUEUE_CAPACITY")
                .unwrap_or(defaults.queue_capacity),
            history_limit: parsed_env("SPOTTER_HISTORY_LIMIT"),
            detect_timeout: parsed_env("SPOTTER_DETECT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.detect_timeout),
            max_body_size: parsed_env("SPOTTER_MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            runtime_library: env_var("SPOTTER_RUNTIME_LIBRARY").map(PathBuf::from),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.parse().ok())
}
