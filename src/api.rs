//! HTTP API for posture checks and detection history.
//!
//! - `POST /check` — run one detection on a webcam frame
//! - `GET /api/records` — list stored detections
//! - `GET /health` — liveness check
//! - `GET /` and `/static/*` — the bundled web page

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::detector::{DetectionResponse, Detector};
use crate::records::{DetectionRecord, RecordStore};
use crate::Error;

pub const SERVICE_NAME: &str = "Posture Guardian";
const DEFAULT_RECORD_LIMIT: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<Detector>,
    pub store: Arc<RecordStore>,
    pub static_dir: PathBuf,
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CheckRequest {
    #[serde(default)]
    image: Option<String>,
}

#[derive(Deserialize)]
struct RecordsQuery {
    date: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct RecordsResponse {
    count: usize,
    records: Vec<DetectionRecord>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

/// Maps pipeline errors onto HTTP responses.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            Error::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            Error::AnalysisUnavailable(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "AI Analysis failed",
                    "score": 0,
                    "is_qualified": false,
                    "issues": ["分析服务暂时不可用"],
                    "audio": null
                })),
            )
                .into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": other.to_string() })),
            )
                .into_response(),
        }
    }
}

/// Build the axum router.
pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(handle_index))
        .route("/check", post(handle_check))
        .route("/api/records", get(handle_records))
        .route("/health", get(handle_health))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
///
/// # Errors
///
/// Returns error if the address cannot be bound or the server fails
pub async fn serve(state: AppState, addr: &str) -> crate::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("{SERVICE_NAME} listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

async fn handle_check(
    State(state): State<AppState>,
    payload: Result<Json<CheckRequest>, JsonRejection>,
) -> Result<Json<DetectionResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| {
        error!("Failed to parse request body: {e}");
        Error::InvalidInput("Invalid JSON".into())
    })?;

    let image = req
        .image
        .filter(|image| !image.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("No image provided".into()))?;

    let response = state.detector.check(&image).await?;
    Ok(Json(response))
}

async fn handle_records(
    State(state): State<AppState>,
    query: Result<Query<RecordsQuery>, QueryRejection>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let Query(query) =
        query.map_err(|e| Error::InvalidInput(format!("invalid query: {e}")))?;

    let date = query
        .date
        .filter(|d| !d.is_empty())
        .map(|d| {
            NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                .map_err(|_| Error::InvalidInput(format!("invalid date '{d}', expected YYYY-MM-DD")))
        })
        .transpose()?;
    let limit = query.limit.unwrap_or(DEFAULT_RECORD_LIMIT);

    let records = tokio::task::spawn_blocking({
        let store = state.store.clone();
        move || store.list(date, limit)
    })
    .await
    .map_err(|e| Error::Persistence(format!("record listing task failed: {e}")))?;
    Ok(Json(RecordsResponse {
        count: records.len(),
        records,
    }))
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}

async fn handle_index(State(state): State<AppState>) -> (StatusCode, Html<String>) {
    let index_path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index_path).await {
        Ok(page) => (StatusCode::OK, Html(page)),
        Err(e) => {
            warn!("Cannot serve {}: {e}", index_path.display());
            (
                StatusCode::NOT_FOUND,
                Html("<h1>请创建 static/index.html 文件</h1>".to_string()),
            )
        }
    }
}
