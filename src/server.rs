use crate::config::{GenerationConfig, SessionCap};
use crate::data::{Assignment, AssignmentId};
use crate::error::{GenerateError, RequestError};
use crate::memory::{InMemoryAssignments, InMemoryCatalog};
use crate::report::GenerationReport;
use crate::solver::{GenerationRequest, Generator};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct AppState {
    pub catalog: InMemoryCatalog,
    pub assignments: InMemoryAssignments,
    pub config: GenerationConfig,
    runs: AtomicU64,
}

impl AppState {
    pub fn new(catalog: InMemoryCatalog, config: GenerationConfig) -> Self {
        let assignments = catalog.assignment_store();
        Self {
            catalog,
            assignments,
            config,
            runs: AtomicU64::new(0),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, message: String) -> ApiError {
    (status, Json(ErrorBody { error: message }))
}

/// Body of a generation request; both fields optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGenerateRequest {
    #[serde(alias = "program_id")]
    program_id: Option<Value>,
    #[serde(alias = "max_per_class")]
    max_per_class: Option<Value>,
}

/// Accepts JSON integers and numeric strings; anything else is `None`.
fn positive_integer(value: &Value) -> Option<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

pub fn parse_request(body: &[u8]) -> Result<GenerationRequest, RequestError> {
    let raw: RawGenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RawGenerateRequest::default()
    } else {
        serde_json::from_slice(body).map_err(|e| RequestError::Malformed(e.to_string()))?
    };

    let program = raw
        .program_id
        .as_ref()
        .map(|v| positive_integer(v).ok_or(RequestError::InvalidProgram))
        .transpose()?;
    let cap = match raw.max_per_class.as_ref() {
        None => SessionCap::default(),
        Some(v) => positive_integer(v)
            .ok_or(RequestError::InvalidCap {
                max: crate::config::MAX_SESSION_CAP,
            })
            .and_then(SessionCap::new)?,
    };
    Ok(GenerationRequest { program, cap })
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<GenerationReport>, ApiError> {
    let request = parse_request(&body).map_err(|e| {
        warn!("Rejected generation request: {e}");
        api_error(StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let run_id = state.runs.fetch_add(1, Ordering::Relaxed) + 1;
    let generator = Generator::new(&state.catalog, &state.assignments, &state.config);
    match generator.run(run_id, &request) {
        Ok(report) => Ok(Json(report)),
        Err(e @ (GenerateError::NoTimeSlots | GenerateError::NoActiveRooms)) => {
            warn!("Run {run_id} aborted: {e}");
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e @ GenerateError::Catalog(_)) => {
            error!("Run {run_id} failed: {e}");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "timetable generation failed".to_string(),
            ))
        }
    }
}

async fn assignments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Assignment>>, ApiError> {
    state.assignments.active().map(Json).map_err(|e| {
        error!("Listing assignments failed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

async fn deactivate_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<AssignmentId>,
) -> Result<Json<Value>, ApiError> {
    if id == 0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "invalid assignment id".to_string()));
    }
    match state.assignments.deactivate(id) {
        Ok(true) => {
            info!("Assignment {id} deactivated");
            Ok(Json(serde_json::json!({ "ok": true, "id": id })))
        }
        Ok(false) => Err(api_error(
            StatusCode::NOT_FOUND,
            format!("assignment {id} not found or already inactive"),
        )),
        Err(e) => {
            error!("Deactivating assignment {id} failed: {e}");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn health_handler() -> Json<Value> {
    Json(serde_json::json!({ "ok": true }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/timetable/generate", post(generate_handler))
        .route("/v1/assignments", get(assignments_handler))
        .route("/v1/assignments/:id", delete(deactivate_handler))
        .with_state(state)
}

pub async fn run_server(addr: SocketAddr, state: Arc<AppState>) -> std::io::Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
