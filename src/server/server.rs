use anyhow::{Context, Result};
use std::{net::SocketAddr, time::Duration};

use tracing::{error, info};

use crate::catalog::{TrackFilters, TrackId, TrackRecord};
use crate::library::{Library, LibraryError};
use crate::ratings::{PlayedTrack, Rating};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    log_requests, metrics::metrics_handler, session::Session, state::*, ServerConfig,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

/// A JSON error body, `{"detail": ...}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, detail: S) -> ApiError {
        ApiError {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, "Song not found"),
            other => {
                error!("Library operation failed: {}", other);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

/// Runs a library operation on the blocking pool, it reads and writes files
/// and waits on ledger locks.
async fn with_library<T, F>(library: GuardedLibrary, operation: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Library) -> Result<T, LibraryError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || operation(&library))
        .await
        .map_err(|err| {
            error!("Library task failed: {}", err);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })?;
    Ok(result?)
}

#[derive(Serialize, Debug, PartialEq)]
struct SongResponse {
    id: TrackId,
    path: String,
    title: Option<String>,
    game_title: Option<String>,
    duration: f64,
    loop_start: i64,
    loop_end: i64,
}

impl From<TrackRecord> for SongResponse {
    fn from(track: TrackRecord) -> Self {
        SongResponse {
            id: track.id,
            path: track.relative_path,
            title: track.title,
            game_title: track.game_title,
            duration: track.duration_seconds,
            loop_start: track.loop_start_micros,
            loop_end: track.loop_end_micros,
        }
    }
}

#[derive(Deserialize, Debug)]
struct PlayBody {
    pub timestamp: i64,
    pub rating: i64,
}

#[derive(Serialize, Debug)]
struct PlayResponse {
    rating: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct ImportBody {
    pub songs: Vec<PlayedTrack>,
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    };
    Json(stats)
}

async fn get_random_song(
    session: Session,
    State(library): State<GuardedLibrary>,
    filters: Result<Query<TrackFilters>, QueryRejection>,
) -> Result<Json<SongResponse>, ApiError> {
    let Query(filters) = filters?;
    let track = with_library(library, move |library| {
        library.get_random_track(&session.username, &filters)
    })
    .await?;
    match track {
        Some(track) => Ok(Json(track.into())),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "No song found")),
    }
}

async fn get_song_file(
    _session: Session,
    State(library): State<GuardedLibrary>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = with_library(library, move |library| {
        library.get_track_bytes(&TrackId(id))
    })
    .await?;
    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

async fn post_song_play(
    session: Session,
    State(library): State<GuardedLibrary>,
    Path(id): Path<String>,
    body: Result<Json<PlayBody>, JsonRejection>,
) -> Result<Json<PlayResponse>, ApiError> {
    let Json(body) = body?;
    let rating = Rating::for_play(body.rating)
        .map_err(|err| ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;
    let rating = with_library(library, move |library| {
        library.record_play(&session.username, &TrackId(id), body.timestamp, rating)
    })
    .await?;
    Ok(Json(PlayResponse { rating }))
}

async fn get_ratings_export(
    session: Session,
    State(library): State<GuardedLibrary>,
) -> Result<Json<Vec<PlayedTrack>>, ApiError> {
    let songs = with_library(library, move |library| {
        library.export_ratings(&session.username)
    })
    .await?;
    Ok(Json(songs))
}

async fn post_ratings_import(
    session: Session,
    State(library): State<GuardedLibrary>,
    body: Result<Json<ImportBody>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = body?;
    with_library(library, move |library| {
        library.import_ratings(&session.username, body.songs)
    })
    .await?;
    Ok(StatusCode::OK)
}

pub fn make_app(config: ServerConfig, library: GuardedLibrary, user_store: GuardedUserStore) -> Router {
    let state = ServerState::new(config, library, user_store);

    let song_routes: Router = Router::new()
        .route("/random/", get(get_random_song))
        .route("/{id}/file/", get(get_song_file))
        .route("/{id}/play/", post(post_song_play))
        .with_state(state.clone());

    let ratings_routes: Router = Router::new()
        .route("/export/", get(get_ratings_export))
        .route("/import/", post(post_ratings_import))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    home_router
        .nest("/api/songs", song_routes)
        .nest("/api/ratings", ratings_routes)
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    library: GuardedLibrary,
    user_store: GuardedUserStore,
) -> Result<()> {
    let address = SocketAddr::new(config.bind_address, config.port);
    let metrics_address = SocketAddr::new(config.bind_address, config.metrics_port);
    let app = make_app(config, library, user_store);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Could not bind {}", address))?;
    let metrics_listener = tokio::net::TcpListener::bind(metrics_address)
        .await
        .with_context(|| format!("Could not bind metrics listener {}", metrics_address))?;

    info!("Ready to serve at {}!", address);
    info!("Metrics available at {}!", metrics_address);

    let server = async { axum::serve(listener, app).await.context("Server failed") };
    let metrics_server = async {
        axum::serve(metrics_listener, make_metrics_app())
            .await
            .context("Metrics server failed")
    };
    tokio::try_join!(server, metrics_server)?;
    Ok(())
}
