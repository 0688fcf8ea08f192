//! HTTP API for the UI collaborator
//!
//! REST endpoints under `/api/v1` drive login and the learning session;
//! `/api/v1/events` streams every `TutorEvent` over SSE.

pub mod handlers;
pub mod sse;

use crate::state::SharedState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub port: u16,
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health check (no prefix)
        .route("/health", get(handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                // Profiles
                .route("/login", post(handlers::login))
                .route("/login/recent", post(handlers::login_recent))
                .route("/users/recent", get(handlers::recent_users))
                // Learning session
                .route("/sessions/:user_id", get(handlers::get_session))
                .route("/sessions/:user_id", delete(handlers::close_session))
                .route("/sessions/:user_id/ink", post(handlers::submit_ink))
                .route("/sessions/:user_id/next", post(handlers::next_character))
                .route("/sessions/:user_id/select", post(handlers::select_character))
                .route("/sessions/:user_id/history/clear", post(handlers::clear_history))
                .route("/sessions/:user_id/pronounce", post(handlers::pronounce))
                // Recording
                .route("/sessions/:user_id/recording/start", post(handlers::start_recording))
                .route("/sessions/:user_id/recording/stop", post(handlers::stop_recording))
                .route("/sessions/:user_id/recording/play", post(handlers::play_recording))
                .route("/sessions/:user_id/recording/pcm", post(handlers::upload_pcm))
                // Catalog
                .route("/characters/:character_id", get(handlers::get_character))
                .route("/characters/:character_id/reading", put(handlers::backfill_character))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        // UI is served from a different origin during development
        .layer(CorsLayer::permissive())
}
