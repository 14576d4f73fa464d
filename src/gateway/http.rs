use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::task_store::TaskStore;
use crate::coordinator::Coordinator;
use crate::error::ErrorKind;
use crate::profile::GatewaySettings;
use crate::types::{
    AspectRatio, GenerationRequest, GenerationTask, ImageStyle, ProviderKind, SubmitResult,
};
use crate::{AdgeniusError, Result};

#[derive(Clone)]
pub struct GatewayHttpState {
    coordinator: Arc<Coordinator>,
    tasks: Arc<Mutex<TaskStore>>,
    in_flight: Arc<std::sync::Mutex<HashSet<String>>>,
}

impl GatewayHttpState {
    pub fn new(coordinator: Coordinator) -> Self {
        let defaults = GatewaySettings::default();
        Self {
            coordinator: Arc::new(coordinator),
            tasks: Arc::new(Mutex::new(TaskStore::new(
                defaults.task_ttl(),
                defaults.max_tasks,
            ))),
            in_flight: Arc::new(std::sync::Mutex::new(HashSet::new())),
        }
    }

    /// How long an untouched snapshot is kept, and how many are kept at most.
    pub fn with_task_retention(mut self, ttl: Duration, max_tasks: usize) -> Self {
        self.tasks = Arc::new(Mutex::new(TaskStore::new(ttl, max_tasks)));
        self
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Snapshot of a task the gateway is still tracking, terminal ones included.
    pub async fn task(&self, task_id: &str) -> Option<GenerationTask> {
        self.tasks.lock().await.get(task_id, Instant::now())
    }
}

/// Marks a task id as being checked; released on drop.
struct InFlightGuard {
    ids: Arc<std::sync::Mutex<HashSet<String>>>,
    task_id: String,
}

impl InFlightGuard {
    fn acquire(ids: &Arc<std::sync::Mutex<HashSet<String>>>, task_id: &str) -> Option<Self> {
        let mut set = ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(task_id.to_string()) {
            return None;
        }
        Some(Self {
            ids: ids.clone(),
            task_id: task_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut set = self
            .ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(&self.task_id);
    }
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct GeneratedResponse {
    result: String,
    provider: ProviderKind,
}

#[derive(Debug, Serialize)]
struct QueuedResponse {
    task: GenerationTask,
}

#[derive(Debug, Default, Deserialize)]
struct StylingBody {
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    realism: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateImageBody {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    aspect_ratio: Option<String>,
    #[serde(default, alias = "provider_model")]
    model: Option<String>,
    #[serde(default)]
    styling: Option<StylingBody>,
    #[serde(default)]
    realism: Option<bool>,
}

impl GenerateImageBody {
    fn into_request(self, coordinator: &Coordinator) -> Result<GenerationRequest> {
        let model = coordinator.routing().resolve_model(self.model.as_deref());
        let mut request = GenerationRequest::new(self.prompt).with_model(model);

        if let Some(raw) = non_empty(self.aspect_ratio.as_deref()) {
            request = request.with_aspect_ratio(raw.parse::<AspectRatio>()?);
        }
        let styling = self.styling.unwrap_or_default();
        if let Some(raw) = non_empty(styling.style.as_deref()) {
            request = request.with_style(raw.parse::<ImageStyle>()?);
        }
        if let Some(realism) = self.realism.or(styling.realism) {
            request = request.with_realism(realism);
        }
        Ok(request)
    }
}

#[derive(Debug, Default, Deserialize)]
struct CheckStatusQuery {
    #[serde(default)]
    model: Option<String>,
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|raw| !raw.is_empty())
}

pub fn router(state: GatewayHttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-image", post(handle_generate_image))
        .route("/check-status/:task_id", get(handle_check_status))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn handle_generate_image(
    State(state): State<GatewayHttpState>,
    body: std::result::Result<Json<GenerateImageBody>, JsonRejection>,
) -> std::result::Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let Json(body) = body.map_err(|rejection| {
        error_response(
            StatusCode::BAD_REQUEST,
            ErrorKind::Validation.as_str(),
            rejection.body_text(),
        )
    })?;
    let request = body
        .into_request(&state.coordinator)
        .map_err(|err| adgenius_error_response(&err))?;

    match state
        .coordinator
        .submit(&request)
        .await
        .map_err(|err| adgenius_error_response(&err))?
    {
        SubmitResult::Completed { result, provider } => {
            Ok((StatusCode::OK, Json(GeneratedResponse { result, provider })).into_response())
        }
        SubmitResult::Pending { task } => {
            state.tasks.lock().await.insert(task.clone(), Instant::now());
            Ok((StatusCode::ACCEPTED, Json(QueuedResponse { task })).into_response())
        }
    }
}

/// One status tick. A FAILED snapshot is still a 200: the task itself carries the error.
/// Terminal snapshots are answered from the store without asking the provider again.
async fn handle_check_status(
    State(state): State<GatewayHttpState>,
    Path(task_id): Path<String>,
    Query(query): Query<CheckStatusQuery>,
) -> std::result::Result<Json<GenerationTask>, (StatusCode, Json<ErrorResponse>)> {
    let Some(_guard) = InFlightGuard::acquire(&state.in_flight, &task_id) else {
        return Err(error_response(
            StatusCode::CONFLICT,
            "conflict",
            format!("status check for task {task_id} already in progress"),
        ));
    };

    let known = state.tasks.lock().await.get(&task_id, Instant::now());
    let mut task = match known {
        Some(task) if task.is_terminal() => return Ok(Json(task)),
        Some(task) => task,
        None => {
            let model = state.coordinator.routing().resolve_model(query.model.as_deref());
            let provider = ProviderKind::for_model(model);
            debug!(task_id = %task_id, provider = %provider, "adopting unknown task id");
            GenerationTask::new(task_id.clone(), provider, state.coordinator.poll_policy())
        }
    };

    if let Err(err) = state.coordinator.poll_status(&mut task).await {
        warn!(task_id = %task_id, error = %err, "status check ended task");
    }

    state.tasks.lock().await.insert(task.clone(), Instant::now());
    Ok(Json(task))
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Provider | ErrorKind::Transport => StatusCode::BAD_GATEWAY,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn adgenius_error_response(err: &AdgeniusError) -> (StatusCode, Json<ErrorResponse>) {
    let kind = err.kind();
    error_response(status_for(kind), kind.as_str(), err.to_string())
}

fn error_response(
    status: StatusCode,
    kind: &'static str,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: ErrorDetail {
                kind,
                message: message.into(),
            },
        }),
    )
}
