//! HTTP request handlers
//!
//! Thin wrappers over the profile, session and catalog operations. Errors
//! map to a status code plus `{"status": "error: ..."}`.

use super::AppContext;
use crate::audio::pcm_from_le_bytes;
use crate::db::characters;
use crate::error::Error;
use crate::ink::Ink;
use crate::profile;
use crate::reference::StrokeReference;
use crate::session::SessionSnapshot;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hanzi_common::db::{Character, User};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
    git_hash: String,
    build_timestamp: String,
    build_profile: String,
    port: u16,
    active_sessions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    #[serde(default)]
    pub avatar: String,
    pub grade: i64,
}

#[derive(Debug, Deserialize)]
pub struct RecentLoginRequest {
    pub user_id: i64,
    #[serde(default)]
    pub avatar: String,
    pub grade: i64,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub session: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
pub struct InkRequest {
    pub ink: Ink,
}

#[derive(Debug, Serialize)]
pub struct InkResponse {
    pub generation: u64,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub character_id: String,
    #[serde(default)]
    pub review: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

#[derive(Debug, Serialize)]
pub struct PronounceResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct StarsResponse {
    pub stars: i64,
}

#[derive(Debug, Serialize)]
pub struct CharacterResponse {
    pub character: Character,
    /// Reference stroke geometry, when the data directory has it
    pub reference: Option<StrokeReference>,
}

#[derive(Debug, Deserialize)]
pub struct ReadingRequest {
    pub pinyin: String,
    #[serde(default)]
    pub strokes: String,
}

type ApiError = (StatusCode, Json<StatusResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(e: Error) -> ApiError {
    let status = match &e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::BadRequest(_) | Error::Decode(_) => StatusCode::BAD_REQUEST,
        Error::InvalidState(_) => StatusCode::CONFLICT,
        Error::AudioDevice(_) | Error::Recognizer(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!("Request failed: {}", e);
    } else {
        warn!("Request rejected: {}", e);
    }

    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", e),
        }),
    )
}

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health(State(ctx): State<AppContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "hanzi-tutor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: env!("GIT_HASH").to_string(),
        build_timestamp: env!("BUILD_TIMESTAMP").to_string(),
        build_profile: env!("BUILD_PROFILE").to_string(),
        port: ctx.port,
        active_sessions: ctx.state.session_count().await,
    })
}

// ============================================================================
// Profile Endpoints
// ============================================================================

/// POST /api/v1/login - log in or register, then start a session
pub async fn login(State(ctx): State<AppContext>, Json(req): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    let user = profile::login_or_register(&ctx.state.db, &req.name, &req.avatar, req.grade)
        .await
        .map_err(api_error)?;
    open_session(&ctx, user).await
}

/// POST /api/v1/login/recent - log in a user from the recent list
pub async fn login_recent(
    State(ctx): State<AppContext>,
    Json(req): Json<RecentLoginRequest>,
) -> ApiResult<LoginResponse> {
    let user = profile::login_recent(&ctx.state.db, req.user_id, &req.avatar, req.grade)
        .await
        .map_err(api_error)?;
    open_session(&ctx, user).await
}

async fn open_session(ctx: &AppContext, user: User) -> ApiResult<LoginResponse> {
    let session = ctx.state.open_session(user).await.map_err(api_error)?;
    let snapshot = session.snapshot().await;
    info!("Session opened for user {}", snapshot.user.id);

    Ok(Json(LoginResponse {
        user: snapshot.user.clone(),
        session: snapshot,
    }))
}

/// GET /api/v1/users/recent
pub async fn recent_users(State(ctx): State<AppContext>) -> ApiResult<Vec<User>> {
    profile::recent_users(&ctx.state.db).await.map(Json).map_err(api_error)
}

// ============================================================================
// Session Endpoints
// ============================================================================

/// GET /api/v1/sessions/:user_id - session snapshot
pub async fn get_session(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<SessionSnapshot> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    Ok(Json(session.snapshot().await))
}

/// DELETE /api/v1/sessions/:user_id - log out
pub async fn close_session(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<StatusResponse> {
    if ctx.state.close_session(user_id).await {
        Ok(ok())
    } else {
        Err(api_error(Error::NotFound(format!("no session for user {}", user_id))))
    }
}

/// POST /api/v1/sessions/:user_id/ink - submit handwriting
pub async fn submit_ink(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Json(req): Json<InkRequest>,
) -> ApiResult<InkResponse> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    let generation = session.submit_ink(req.ink).await.map_err(api_error)?;
    Ok(Json(InkResponse { generation }))
}

/// POST /api/v1/sessions/:user_id/next - skip to the next character
pub async fn next_character(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<SessionSnapshot> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    session.load_next().await.map_err(api_error)?;
    Ok(Json(session.snapshot().await))
}

/// POST /api/v1/sessions/:user_id/select - pick a character
pub async fn select_character(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    Json(req): Json<SelectRequest>,
) -> ApiResult<SessionSnapshot> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    session
        .select_character(&req.character_id, req.review)
        .await
        .map_err(api_error)?;
    Ok(Json(session.snapshot().await))
}

/// POST /api/v1/sessions/:user_id/history/clear - forget the last attempt
pub async fn clear_history(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<ClearResponse> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    let cleared = session.clear_history_ink().await.map_err(api_error)?;
    Ok(Json(ClearResponse { cleared }))
}

/// POST /api/v1/sessions/:user_id/pronounce - speak the current character
pub async fn pronounce(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<PronounceResponse> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    let text = session.pronounce_current().await.map_err(api_error)?;
    Ok(Json(PronounceResponse { text }))
}

// ============================================================================
// Recording Endpoints
// ============================================================================

/// POST /api/v1/sessions/:user_id/recording/start
pub async fn start_recording(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<StatusResponse> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    session.start_recording().await.map_err(api_error)?;
    Ok(ok())
}

/// POST /api/v1/sessions/:user_id/recording/stop - stop and rate the clip
pub async fn stop_recording(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<StarsResponse> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    let stars = session.stop_recording().await.map_err(api_error)?;
    Ok(Json(StarsResponse { stars }))
}

/// POST /api/v1/sessions/:user_id/recording/play - replay the last clip
pub async fn play_recording(State(ctx): State<AppContext>, Path(user_id): Path<i64>) -> ApiResult<StatusResponse> {
    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    session.play_recording().await.map_err(api_error)?;
    Ok(ok())
}

/// POST /api/v1/sessions/:user_id/recording/pcm - rate an uploaded clip
///
/// Body: raw 16 kHz mono 16-bit little-endian PCM.
pub async fn upload_pcm(
    State(ctx): State<AppContext>,
    Path(user_id): Path<i64>,
    body: Bytes,
) -> ApiResult<StarsResponse> {
    if body.len() % 2 != 0 {
        return Err(api_error(Error::BadRequest("PCM body must hold whole 16-bit samples".to_string())));
    }

    let session = ctx.state.session(user_id).await.map_err(api_error)?;
    let stars = session
        .assess_recording(pcm_from_le_bytes(&body))
        .await
        .map_err(api_error)?;
    Ok(Json(StarsResponse { stars }))
}

// ============================================================================
// Catalog Endpoints
// ============================================================================

/// GET /api/v1/characters/:character_id - character with reference geometry
pub async fn get_character(
    State(ctx): State<AppContext>,
    Path(character_id): Path<String>,
) -> ApiResult<CharacterResponse> {
    let character = characters::get_character(&ctx.state.db, &character_id)
        .await
        .map_err(api_error)?
        .ok_or_else(|| api_error(Error::NotFound(format!("character '{}'", character_id))))?;
    let reference = ctx.state.collaborators.reference.lookup(&character_id).await;

    Ok(Json(CharacterResponse { character, reference }))
}

/// PUT /api/v1/characters/:character_id/reading - backfill pinyin and strokes
pub async fn backfill_character(
    State(ctx): State<AppContext>,
    Path(character_id): Path<String>,
    Json(req): Json<ReadingRequest>,
) -> ApiResult<StatusResponse> {
    let updated = characters::backfill(&ctx.state.db, &character_id, &req.pinyin, &req.strokes)
        .await
        .map_err(api_error)?;

    if updated {
        Ok(ok())
    } else {
        Err(api_error(Error::NotFound(format!("character '{}'", character_id))))
    }
}
