//! REST API handlers for shift rostering.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::demo_data::{self, DemoData};
use crate::dto::{
    HealthResponse, InfoResponse, JobDto, PlanningRequestDto, StatusResponse, ValidateRequestDto,
    ValidateResponse,
};
use crate::service::PlanService;
use crate::validation;

/// Application state shared across handlers.
pub struct AppState {
    pub service: PlanService,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            service: PlanService::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

type ApiError = (StatusCode, String);

fn bad_request(err: impl std::fmt::Display) -> ApiError {
    (StatusCode::BAD_REQUEST, err.to_string())
}

// ============================================================================
// Router and Handlers
// ============================================================================

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        // Rosters
        .route("/rosters", get(list_rosters).post(create_roster))
        .route("/rosters/validate", put(validate_roster))
        .route("/rosters/{id}", get(get_roster).delete(stop_solving))
        .route("/rosters/{id}/status", get(get_roster_status))
        .with_state(state)
}

// ============================================================================
// Health & Info
// ============================================================================

/// GET /health - Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// GET /info - Application info endpoint.
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Shift Roster",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: "pumpkin-solver",
    })
}

/// GET /demo-data - List available demo data sets.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - Get a specific demo data set.
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<PlanningRequestDto>, StatusCode> {
    match id.parse::<DemoData>() {
        Ok(demo) => Ok(Json(demo_data::generate(demo))),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Rosters
// ============================================================================

/// POST /rosters - Validate the request and start planning.
/// Returns the job ID as plain text.
async fn create_roster(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<PlanningRequestDto>,
) -> Result<String, ApiError> {
    let input = dto.to_input().map_err(bad_request)?;
    let config = dto.config();
    config.validate().map_err(bad_request)?;

    let id = Uuid::new_v4().to_string();
    let job = state.service.create_job(id.clone(), input, config);
    state.service.start_solving(job);
    Ok(id)
}

/// GET /rosters - List all job IDs.
async fn list_rosters(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.service.list_jobs())
}

/// GET /rosters/{id} - Get a job with its roster once planned.
async fn get_roster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobDto>, StatusCode> {
    match state.service.get_job(&id) {
        Some(job) => Ok(Json(JobDto::from_job(&job.read()))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// GET /rosters/{id}/status - Get a job's status only.
async fn get_roster_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, StatusCode> {
    match state.service.get_job(&id) {
        Some(job) => {
            let guard = job.read();
            let result = guard.result.as_ref();
            Ok(Json(StatusResponse {
                status: guard.status,
                solve_status: result.map(|r| r.status),
                objective: result.and_then(|r| r.objective),
            }))
        }
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// DELETE /rosters/{id} - Cancel planning and remove the job.
async fn stop_solving(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobDto>, StatusCode> {
    state.service.stop_solving(&id);
    match state.service.remove_job(&id) {
        Some(job) => Ok(Json(JobDto::from_job(&job.read()))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// PUT /rosters/validate - Check a submitted roster against every hard rule.
async fn validate_roster(
    Json(dto): Json<ValidateRequestDto>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let input = dto.request.to_input().map_err(bad_request)?;
    let config = dto.request.config();
    config.validate().map_err(bad_request)?;

    let roster = dto.roster.to_roster(&input);
    let issues = validation::validate(&roster, &input, &config);
    Ok(Json(ValidateResponse {
        valid: !issues.iter().any(|issue| issue.is_violation()),
        summaries: roster.summaries(&config.hours),
        issues,
    }))
}
