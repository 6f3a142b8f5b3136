//! HTTP ingress.
//!
//! The request layer does no processing of its own: it validates the
//! source file, builds a task, enqueues it, and replies immediately with
//! the queue position. Results come back later through the callback URL
//! or the `/result/{key}` poll endpoint.

use crate::config::Config;
use crate::delivery::ResultStore;
use crate::task::{queue::JobQueue, AudioFormat, ConvertTask, DiarizeTask, DiarizeTuning, Task};
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub queue: JobQueue,
    pub store: ResultStore,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/speaker", get(speaker))
        .route("/convert", get(convert))
        .route("/result/{key}", get(result))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "model": state.config.models.model,
        "queue_size": state.queue.len(),
    }))
}

#[derive(Debug, Deserialize)]
struct SpeakerParams {
    key: String,
    path: PathBuf,
    /// true (default): write outputs next to the source and notify the
    /// callback URL; false: deliver through the poll store
    #[serde(default = "default_save_to_file")]
    save_to_file: bool,
    threshold: Option<f64>,
    min_nonspeech: Option<f64>,
    min_speakers: Option<u32>,
    max_speakers: Option<u32>,
}

fn default_save_to_file() -> bool {
    true
}

async fn speaker(
    State(state): State<AppState>,
    Query(params): Query<SpeakerParams>,
) -> impl IntoResponse {
    if !params.path.is_file() {
        return not_found(&params.path);
    }

    let task = DiarizeTask {
        key: params.key.clone(),
        source: params.path,
        model: state.config.models.model.clone(),
        device: state.config.models.device.clone(),
        compute_type: state.config.models.compute_type.clone(),
        save_to_file: params.save_to_file,
        tuning: DiarizeTuning {
            threshold: params.threshold,
            min_nonspeech: params.min_nonspeech,
            min_speakers: params.min_speakers,
            max_speakers: params.max_speakers,
        },
    };
    let output_path = task.transcript_path();

    if !params.save_to_file {
        state.store.mark_processing(&params.key);
    }
    if !state.queue.enqueue(Task::Diarize(task)) {
        return worker_gone();
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "queued",
            "queue_size": state.queue.len(),
            "output_path": output_path,
        })),
    )
}

#[derive(Debug, Deserialize)]
struct ConvertParams {
    key: String,
    path: PathBuf,
    /// Target format; defaults to mp3
    #[serde(rename = "type")]
    format: Option<String>,
}

async fn convert(
    State(state): State<AppState>,
    Query(params): Query<ConvertParams>,
) -> impl IntoResponse {
    if !params.path.is_file() {
        return not_found(&params.path);
    }

    let format = match params.format.as_deref() {
        None => AudioFormat::Mp3,
        Some(name) => match name.parse::<AudioFormat>() {
            Ok(format) => format,
            Err(message) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"status": "error", "error": message})),
                );
            }
        },
    };

    let task = ConvertTask {
        key: params.key,
        source: params.path,
        format,
    };
    let output_path = task.output_path();

    if !state.queue.enqueue(Task::Convert(task)) {
        return worker_gone();
    }

    (
        StatusCode::OK,
        Json(json!({
            "status": "queued",
            "queue_size": state.queue.len(),
            "output_path": output_path,
        })),
    )
}

async fn result(
    State(state): State<AppState>,
    UrlPath(key): UrlPath<String>,
) -> impl IntoResponse {
    match state.store.get(&key) {
        Some(record) => (
            StatusCode::OK,
            Json(serde_json::to_value(&record).unwrap_or_else(|_| json!({"status": "error"}))),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"status": "unknown", "key": key})),
        ),
    }
}

fn not_found(path: &std::path::Path) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "status": "error",
            "error": format!("file not found: {}", path.display()),
        })),
    )
}

fn worker_gone() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"status": "error", "error": "worker is not running"})),
    )
}
