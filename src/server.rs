//! HTTP transport layer: thin glue over the detection pipeline.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::detection::Detector;
use crate::error::DetectError;
use crate::models::{BoundingBox, InferenceRecord};
use crate::store::InferenceStore;
use crate::tasks::AnnotationJob;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Detect(#[from] DetectError),

    #[error("detection timed out")]
    Timeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            // A corrupt upload is the caller's fault; everything else that
            // goes wrong mid-pipeline is ours.
            ApiError::Detect(DetectError::Decode(_)) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Detect(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub detector: Arc<Detector>,
    pub store: Arc<InferenceStore>,
    pub annotations: mpsc::Sender<AnnotationJob>,
}

/// Create the service router.
pub fn router(state: AppState) -> Router {
    let max_body = state.config.max_body_size;
    Router::new()
        .route("/health", get(health))
        .route("/detect", post(detect))
        .route("/inferences", get(list_inferences))
        .route("/inferences/:id/image", get(inference_image))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Run detection on an uploaded image.
///
/// Responds with the deduplicated box list as soon as the pipeline finishes;
/// the annotated artifact is produced in the background and shows up under
/// `/inferences/{id}/image` a moment later.
async fn detect(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Vec<BoundingBox>>> {
    let mut name: Option<String> = None;
    let mut file: Option<axum::body::Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("file") => {
                if name.is_none() {
                    name = field.file_name().map(str::to_string);
                }
                file = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let data = file.ok_or_else(|| ApiError::BadRequest("missing `file` field".to_string()))?;
    let record = InferenceRecord {
        id: Uuid::new_v4().to_string(),
        name: name.filter(|n| !n.is_empty()).unwrap_or_else(|| "upload".to_string()),
        size: data.len() as u64,
    };
    info!(id = %record.id, name = %record.name, size = record.size, "detection request");
    state.store.append(record.clone());

    // Decode failure rejects the request outright, never retried.
    let image = image::load_from_memory(&data).map_err(DetectError::Decode)?;

    let detector = Arc::clone(&state.detector);
    let pipeline_image = image.clone();
    // The deadline only abandons the response; the blocking pipeline task
    // is not preemptible and runs to completion in the background.
    let boxes = tokio::time::timeout(
        state.config.detect_timeout,
        tokio::task::spawn_blocking(move || detector.detect(&pipeline_image)),
    )
    .await
    .map_err(|_| ApiError::Timeout)?
    .map_err(|e| ApiError::Internal(e.to_string()))??;
    info!(id = %record.id, boxes = boxes.len(), "detection finished");

    let path = state
        .config
        .output_dir
        .join(format!("{}_{}.jpg", record.id, artifact_stem(&record.name)));
    let job = AnnotationJob {
        id: record.id.clone(),
        image,
        boxes: boxes.clone(),
        path,
        done: None,
    };
    if state.annotations.send(job).await.is_err() {
        error!(id = %record.id, "annotation queue closed, artifact will not be produced");
    }

    Ok(Json(boxes))
}

async fn list_inferences(State(state): State<AppState>) -> Json<Vec<InferenceRecord>> {
    Json(state.store.records())
}

/// Serve the annotated artifact for a finished job.
///
/// Returns 404 until background annotation completes, and permanently if it
/// failed.
async fn inference_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let path = state
        .store
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("no annotated image for `{id}`")))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::NotFound(format!("annotated image for `{id}` unavailable")))?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response())
}

/// Reduce a display name to something safe inside a file name.
fn artifact_stem(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name);
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}
