use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    ActorId, FeasibilityReport, InitializeRequest, StageProgress, StepUpdate,
    TalentProgressStatus, TimelineError, TimelineFormData, TimelineResult, WorkflowError,
    WorkflowRun, WorkflowService, WorkflowStep, persistence::PersistenceError,
};

#[derive(Clone)]
pub struct AppState {
    service: Arc<WorkflowService>,
}

impl AppState {
    pub fn new(service: WorkflowService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    fn service(&self) -> Arc<WorkflowService> {
        self.service.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl From<WorkflowError> for ApiError {
    fn from(value: WorkflowError) -> Self {
        let message = value.to_string();
        match value {
            WorkflowError::ProjectNotFound(_)
            | WorkflowError::StepNotFound(_)
            | WorkflowError::UserNotFound(_) => ApiError::NotFound(message),
            WorkflowError::ReplaceNotConfirmed { .. }
            | WorkflowError::InvalidStatusTransition { .. } => ApiError::Conflict(message),
            WorkflowError::InvalidConfiguration { .. } | WorkflowError::InvalidProgress(_) => {
                ApiError::Invalid(message)
            }
            WorkflowError::Storage(PersistenceError::NotFound { .. }) => {
                ApiError::NotFound(message)
            }
            WorkflowError::Storage(PersistenceError::InvalidData(_)) => ApiError::Invalid(message),
            WorkflowError::StageGraph(_) | WorkflowError::Storage(_) => ApiError::Internal(message),
        }
    }
}

impl From<TimelineError> for ApiError {
    fn from(value: TimelineError) -> Self {
        ApiError::Invalid(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct DueDatePayload {
    actor: ActorId,
    due_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct StepUpdatePayload {
    actor: ActorId,
    #[serde(flatten)]
    update: StepUpdate,
}

#[derive(Debug, Deserialize)]
struct ClassifyPayload {
    #[serde(flatten)]
    progress: StageProgress,
    #[serde(default)]
    today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    status: TalentProgressStatus,
    progress: i32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/projects/:id/workflow",
            get(list_steps).post(initialize_workflow),
        )
        .route("/projects/:id/due_date", put(update_due_date))
        .route("/projects/:id/feasibility", get(feasibility))
        .route("/steps/:id", patch(update_step))
        .route("/timeline", post(timeline))
        .route("/progress/classify", post(classify_progress))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, service: WorkflowService) -> std::io::Result<()> {
    let state = AppState::new(service);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "comic-workflow HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn list_steps(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
) -> Result<Json<Vec<WorkflowStep>>, ApiError> {
    let steps = state.service().steps(project_id)?;
    Ok(Json(steps))
}

async fn initialize_workflow(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
    Json(request): Json<InitializeRequest>,
) -> Result<(StatusCode, Json<WorkflowRun>), ApiError> {
    let run = state.service().initialize_workflow(project_id, &request)?;
    Ok((StatusCode::CREATED, Json(run)))
}

async fn update_due_date(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
    Json(payload): Json<DueDatePayload>,
) -> Result<Json<Option<WorkflowRun>>, ApiError> {
    let run = state.service().recompute_on_due_date_change(
        project_id,
        payload.due_date,
        &payload.actor,
    )?;
    Ok(Json(run))
}

async fn feasibility(
    State(state): State<AppState>,
    Path(project_id): Path<i32>,
) -> Result<Json<FeasibilityReport>, ApiError> {
    Ok(Json(state.service().feasibility(project_id)?))
}

async fn update_step(
    State(state): State<AppState>,
    Path(step_id): Path<i32>,
    Json(payload): Json<StepUpdatePayload>,
) -> Result<Json<WorkflowStep>, ApiError> {
    let step = state
        .service()
        .update_step(step_id, &payload.update, &payload.actor)?;
    Ok(Json(step))
}

async fn timeline(
    State(state): State<AppState>,
    Json(form): Json<TimelineFormData>,
) -> Result<Json<TimelineResult>, ApiError> {
    Ok(Json(state.service().calculate_timeline(&form)?))
}

async fn classify_progress(
    State(state): State<AppState>,
    Json(payload): Json<ClassifyPayload>,
) -> Json<ClassifyResponse> {
    let service = state.service();
    let status = service.classify_progress(&payload.progress, payload.today);
    let progress = crate::progress::progress_percent(
        payload.progress.completed_pages,
        payload.progress.total_pages,
    );
    Json(ClassifyResponse { status, progress })
}
