//! Axum router, shared state, and request handlers.
//!
//! The HTTP surface mirrors the generation pipeline: validate the filter,
//! resolve segments through the lookup store, run a generation session,
//! spool the result, partition when oversized, and hand back descriptors
//! with human-readable sizes and download URLs. Filter validation lives
//! here, before the engine is invoked; the engine assumes validated input.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use numspool::{
    FilterSpec, GenerationEngine, Partition, SuffixRule, artifact_file_name, format_size,
    partition_artifact, write_artifact,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::auth::{self, Sessions};
use crate::server::config::ServerConfig;
use crate::server::error::ApiError;
use crate::server::store::SegmentStore;

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: GenerationEngine,
    pub store: SegmentStore,
    pub sessions: Arc<Sessions>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(engine: GenerationEngine, store: SegmentStore, config: ServerConfig) -> Self {
        Self {
            engine,
            store,
            sessions: Arc::new(Sessions::default()),
            config: Arc::new(config),
        }
    }
}

/// Builds the service router. Login routes stay outside the guard so a
/// logged-out client can still log in.
pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/api/provinces", get(provinces))
        .route("/api/cities/{province}", get(cities))
        .route("/api/generate", post(generate))
        .route("/api/cleanup", post(cleanup))
        .route("/download/{filename}", get(download))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_login,
        ));

    Router::new()
        .merge(guarded)
        .route("/api/login", post(auth::login))
        .route("/api/logout", post(auth::logout))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct ListResponse {
    code: u16,
    data: Vec<String>,
}

#[derive(Serialize)]
struct GenerateResponse {
    code: u16,
    message: String,
    data: GenerateData,
}

#[derive(Serialize)]
struct GenerateData {
    count: usize,
    files: Vec<FileEntry>,
}

#[derive(Serialize)]
struct FileEntry {
    name: String,
    size: String,
    url: String,
}

#[derive(Serialize)]
struct CleanupResponse {
    code: u16,
    message: String,
    deleted: u64,
}

/// Raw generation request body, as submitted by the client.
#[derive(Deserialize)]
pub struct GenerateRequest {
    prefix: Option<String>,
    suffix_4: Option<String>,
    suffix_3: Option<String>,
    province: Option<String>,
    city: Option<String>,
    #[serde(default)]
    operators: Vec<u8>,
}

impl GenerateRequest {
    /// Validates the request into a [`FilterSpec`] carrying the configured
    /// generation ceiling.
    fn into_filter(self, max_count: usize) -> Result<FilterSpec, ApiError> {
        let inv = |msg: &str| ApiError::InvalidFilter(msg.to_owned());

        let prefix = normalize(self.prefix).ok_or_else(|| inv("the 3-digit prefix is required"))?;
        if prefix.len() != 3 || !is_digits(&prefix) {
            return Err(inv("prefix must be exactly 3 digits"));
        }

        let province = normalize(self.province).ok_or_else(|| inv("province is required"))?;
        let city = normalize(self.city).ok_or_else(|| inv("city is required"))?;

        let rule = match (normalize(self.suffix_4), normalize(self.suffix_3)) {
            (Some(_), Some(_)) => {
                return Err(inv("only one of suffix_4 and suffix_3 may be set"));
            }
            (Some(s), None) => {
                if s.len() != 4 || !is_digits(&s) {
                    return Err(inv("suffix_4 must be exactly 4 digits"));
                }
                SuffixRule::Exact4(s)
            }
            (None, Some(s)) => {
                if s.len() != 3 || !is_digits(&s) {
                    return Err(inv("suffix_3 must be exactly 3 digits"));
                }
                SuffixRule::Exact3(s)
            }
            (None, None) => SuffixRule::All,
        };

        for &op in &self.operators {
            if !(1..=5).contains(&op) {
                return Err(ApiError::InvalidFilter(format!(
                    "invalid operator code: {op}"
                )));
            }
        }

        Ok(FilterSpec {
            prefix,
            province,
            city,
            operators: self.operators,
            rule,
            max_count,
        })
    }
}

fn normalize(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// GET /api/provinces
async fn provinces(State(state): State<AppState>) -> Result<Json<ListResponse>, ApiError> {
    let store = state.store.clone();
    let data = tokio::task::spawn_blocking(move || store.provinces()).await??;
    Ok(Json(ListResponse { code: 200, data }))
}

/// GET /api/cities/{province}
async fn cities(
    State(state): State<AppState>,
    Path(province): Path<String>,
) -> Result<Json<ListResponse>, ApiError> {
    let store = state.store.clone();
    let data = tokio::task::spawn_blocking(move || store.cities(&province)).await??;
    Ok(Json(ListResponse { code: 200, data }))
}

/// POST /api/generate
async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let filter = req.into_filter(state.engine.config().max_count)?;

    let store = state.store.clone();
    let lookup = filter.clone();
    let segments = tokio::task::spawn_blocking(move || {
        store.find_segments(
            &lookup.prefix,
            &lookup.province,
            &lookup.city,
            &lookup.operators,
        )
    })
    .await??;

    if segments.is_empty() {
        return Err(ApiError::NoMatches);
    }

    let cancel = CancellationToken::new();
    let ids = state.engine.generate(&filter, segments, &cancel).await?;
    let count = ids.len();

    let name = artifact_file_name(&filter, Local::now());
    let spool = state.config.spool_dir.clone();
    let max_bytes = state.engine.config().max_partition_bytes();
    let max_lines = state.engine.config().max_partition_lines;

    let partitions = tokio::task::spawn_blocking(move || -> numspool::Result<Vec<Partition>> {
        let artifact = write_artifact(&ids, &spool, &name)?;
        partition_artifact(&artifact, max_bytes, max_lines)
    })
    .await??;

    let files = partitions
        .iter()
        .map(|p| FileEntry {
            name: p.name.clone(),
            size: format_size(p.size_bytes),
            url: format!("/download/{}", p.name),
        })
        .collect();

    Ok(Json(GenerateResponse {
        code: 200,
        message: "generation complete".to_owned(),
        data: GenerateData { count, files },
    }))
}

/// GET /download/{filename}
async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    // Spool files are single path components; anything else is not ours.
    if filename.contains(['/', '\\']) || filename.contains("..") {
        return Err(ApiError::MissingFile(filename));
    }

    // A vanished file means the retention sweep (or a concurrent cleanup)
    // got there first; report it as expired rather than crashing.
    let path = state.config.spool_dir.join(&filename);
    let file = tokio::fs::File::open(&path).await.map_err(|_| {
        ApiError::from(numspool::Error::ArtifactExpired {
            name: filename.clone(),
        })
    })?;

    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(e.into()))
}

/// POST /api/cleanup
async fn cleanup(State(state): State<AppState>) -> Result<Json<CleanupResponse>, ApiError> {
    let spool = state.config.spool_dir.clone();
    let max_age = state.engine.config().artifact_expiry();
    let deleted = tokio::task::spawn_blocking(move || numspool::sweep(&spool, max_age)).await?;

    Ok(Json(CleanupResponse {
        code: 200,
        message: format!("removed {deleted} expired files"),
        deleted,
    }))
}
