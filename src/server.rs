//! Read-side HTTP API.
//!
//! Serves stored summary records as JSON. The API never writes; records only
//! enter the store through the ingestion pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/eos` | List records, newest first. Optional `president`, `year`, `month`, `day` query filters |
//! | `GET`  | `/api/eos/{id}` | One record by identifier |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Errors are a flat JSON object:
//!
//! ```json
//! { "error": "No matching executive orders found." }
//! ```
//!
//! An empty result or unknown identifier is a `404`; `500` is reserved for
//! store failures.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::models::SummaryRecord;
use crate::sqlite_store::SqliteStore;
use crate::store::{RecordFilter, Store};

const NO_MATCHES: &str = "No matching executive orders found.";
const NOT_FOUND: &str = "Executive order not found.";

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn Store>,
}

/// Build the API router over any [`Store`].
pub fn router(store: Arc<dyn Store>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/eos", get(handle_list))
        .route("/api/eos/{id}", get(handle_get))
        .route("/health", get(handle_health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store })
}

/// Starts the read API on `[server].bind` backed by the SQLite store.
///
/// Runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));

    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "read API listening");
    println!("Read API listening on http://{}", bind_addr);

    axum::serve(listener, router(store))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Error type that converts into an Axum HTTP response.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

fn not_found(message: &str) -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        message: message.to_string(),
    }
}

fn store_error(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{:#}", err), "store query failed");
    ApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: "Failed to query executive orders.".to_string(),
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

// ============ GET /api/eos ============

async fn handle_list(
    State(state): State<AppState>,
    Query(filter): Query<RecordFilter>,
) -> Result<Json<Vec<SummaryRecord>>, ApiError> {
    let records = state
        .store
        .list(&filter.normalized())
        .await
        .map_err(store_error)?;

    if records.is_empty() {
        return Err(not_found(NO_MATCHES));
    }
    Ok(Json(records))
}

// ============ GET /api/eos/{id} ============

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SummaryRecord>, ApiError> {
    state
        .store
        .get(&id)
        .await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| not_found(NOT_FOUND))
}
