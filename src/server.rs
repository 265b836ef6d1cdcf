//! HTTP API server.
//!
//! Exposes agent CRUD and contact-list ingestion over JSON.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (unauthenticated) |
//! | `GET`  | `/api/agents` | List active agents |
//! | `POST` | `/api/agents` | Create an agent |
//! | `GET`  | `/api/agents/{id}` | Fetch one agent |
//! | `PUT`  | `/api/agents/{id}` | Update an agent |
//! | `POST` | `/api/lists/upload` | Upload + distribute a CSV/XLSX/XLS file |
//! | `GET`  | `/api/lists` | All ingestion results, newest first |
//! | `GET`  | `/api/lists/{id}` | One ingestion result |
//!
//! # Error Contract
//!
//! All error responses share one schema:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "name is required" } }
//! ```
//!
//! Codes: `unauthorized` (401), `bad_request` (400), `not_found` (404),
//! `payload_too_large` (413), `internal` (500).
//!
//! # Auth
//!
//! Every `/api` route requires a static bearer token from `[auth.tokens]`;
//! the matching key becomes the caller identity that uploads are attributed
//! to. Token issuance and rotation happen outside this service.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Extension, Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::db;
use crate::error::IngestError;
use crate::ingest::{Ingestor, Upload};
use crate::models::{
    validate_agent_fields, Agent, AgentUpdate, IngestionResult, NewAgent,
};
use crate::spool::{DiskSpool, FileSpool};
use crate::store::{AgentDirectory, ListStore, SqliteStore};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<SqliteStore>,
    spool: Arc<dyn FileSpool>,
    ingestor: Arc<Ingestor>,
    /// bearer token → caller identity. Config guarantees token values are
    /// unique, so the inversion is lossless.
    tokens: Arc<HashMap<String, String>>,
}

/// Starts the HTTP server. Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    if config.auth.tokens.is_empty() {
        anyhow::bail!("refusing to serve without auth tokens; add [auth.tokens] to the config");
    }

    let pool = db::connect(config).await?;
    let store = Arc::new(SqliteStore::new(pool));
    let spool: Arc<dyn FileSpool> = Arc::new(DiskSpool::new(config.uploads.dir.clone()));
    let ingestor = Arc::new(Ingestor::new(
        store.clone() as Arc<dyn AgentDirectory>,
        store.clone() as Arc<dyn ListStore>,
        spool.clone(),
        config.uploads.max_bytes,
    ));

    let tokens: HashMap<String, String> = config
        .auth
        .tokens
        .iter()
        .map(|(identity, token)| (token.clone(), identity.clone()))
        .collect();

    let state = AppState {
        store,
        spool,
        ingestor,
        tokens: Arc::new(tokens),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Multipart framing adds overhead on top of the file itself.
    let body_limit = config.uploads.max_bytes as usize + 64 * 1024;

    let api = Router::new()
        .route("/api/agents", get(list_agents).post(create_agent))
        .route("/api/agents/{id}", get(get_agent).put(update_agent))
        .route("/api/lists", get(list_lists))
        .route("/api/lists/{id}", get(get_list))
        .route("/api/lists/upload", axum::routing::post(upload_list))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .route("/health", get(handle_health))
        .merge(api)
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    tracing::info!(bind = %config.server.bind, "API server listening");

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Auth ============

/// Authenticated caller identity, injected by [`require_auth`].
#[derive(Clone)]
struct CallerIdentity(String);

async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("missing bearer token"))?;

    let caller = state
        .tokens
        .get(token)
        .map(|identity| CallerIdentity(identity.clone()))
        .ok_or_else(|| unauthorized("invalid bearer token"))?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

// ============ Error response ============

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn unauthorized(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::UNAUTHORIZED,
        code: "unauthorized".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

/// The UNIQUE constraints on agents are the authoritative duplicate check;
/// a create racing past the handler's pre-checks surfaces here and is still
/// the client's conflict, not a server fault.
fn duplicate_agent_error(err: IngestError) -> AppError {
    if let IngestError::Persistence(sqlx::Error::Database(db_err)) = &err {
        if db_err.is_unique_violation() {
            return bad_request("agent with this email or mobile number already exists");
        }
    }
    err.into()
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let (status, code) = match &err {
            IngestError::MissingFile
            | IngestError::UnsupportedFormat(_)
            | IngestError::NoActiveAgents
            | IngestError::EmptyDataset
            | IngestError::Parse(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            IngestError::PayloadTooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            IngestError::Io(_) | IngestError::Persistence(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ Agents ============

#[derive(Serialize)]
struct AgentListResponse {
    count: usize,
    agents: Vec<Agent>,
}

async fn list_agents(State(state): State<AppState>) -> Result<Json<AgentListResponse>, AppError> {
    let agents = state.store.list_active().await?;
    Ok(Json(AgentListResponse {
        count: agents.len(),
        agents,
    }))
}

async fn create_agent(
    State(state): State<AppState>,
    Json(new): Json<NewAgent>,
) -> Result<(StatusCode, Json<Agent>), AppError> {
    validate_agent_fields(Some(&new.name), Some(&new.email), Some(&new.mobile))
        .map_err(bad_request)?;

    if state.store.find_agent_by_email(new.email.trim()).await?.is_some() {
        return Err(bad_request("agent with this email already exists"));
    }
    if state
        .store
        .find_agent_by_mobile(new.mobile.trim())
        .await?
        .is_some()
    {
        return Err(bad_request("agent with this mobile number already exists"));
    }

    let agent = state
        .store
        .create_agent(&new)
        .await
        .map_err(duplicate_agent_error)?;
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, AppError> {
    let agent = state
        .store
        .get_agent(&id)
        .await?
        .ok_or_else(|| not_found("agent not found"))?;
    Ok(Json(agent))
}

async fn update_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<AgentUpdate>,
) -> Result<Json<Agent>, AppError> {
    validate_agent_fields(
        update.name.as_deref(),
        update.email.as_deref(),
        update.mobile.as_deref(),
    )
    .map_err(bad_request)?;

    if let Some(email) = update.email.as_deref() {
        if let Some(other) = state.store.find_agent_by_email(email.trim()).await? {
            if other.id != id {
                return Err(bad_request("agent with this email already exists"));
            }
        }
    }
    if let Some(mobile) = update.mobile.as_deref() {
        if let Some(other) = state.store.find_agent_by_mobile(mobile.trim()).await? {
            if other.id != id {
                return Err(bad_request("agent with this mobile number already exists"));
            }
        }
    }

    let agent = state
        .store
        .update_agent(&id, &update)
        .await
        .map_err(duplicate_agent_error)?
        .ok_or_else(|| not_found("agent not found"))?;
    Ok(Json(agent))
}

// ============ Lists ============

#[derive(Serialize)]
struct ListIndexResponse {
    count: usize,
    lists: Vec<IngestionResult>,
}

async fn list_lists(State(state): State<AppState>) -> Result<Json<ListIndexResponse>, AppError> {
    let lists = state.store.list_all().await?;
    Ok(Json(ListIndexResponse {
        count: lists.len(),
        lists,
    }))
}

async fn get_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IngestionResult>, AppError> {
    let list = state
        .store
        .get_by_id(&id)
        .await?
        .ok_or_else(|| not_found("list not found"))?;
    Ok(Json(list))
}

/// Handler for `POST /api/lists/upload`.
///
/// Spools the `file` multipart field and hands it to the [`Ingestor`];
/// every outcome — success or failure — leaves no transient file behind.
async fn upload_list(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestionResult>), AppError> {
    let mut upload: Option<Upload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let handle = state.spool.write(&original_name, &bytes).await?;
        upload = Some(Upload {
            handle,
            original_name,
            size: bytes.len() as u64,
        });
        break;
    }

    let result = state.ingestor.ingest(upload, &caller.0).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    let status = err.status();
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "bad_request"
    };
    AppError {
        status,
        code: code.to_string(),
        message: err.body_text(),
    }
}
