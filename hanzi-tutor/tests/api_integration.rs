//! Integration tests for the tutor HTTP API
//!
//! Exercises the router end to end with fake collaborators:
//! - Health check
//! - Login and the recent-user list
//! - Session snapshot, selection, ink and recordings
//! - Error status mapping
//! - Character lookup and backfill

mod helpers;

use axum::body::Body;
use axum::http::StatusCode;
use hanzi_tutor::api::{create_router, AppContext};
use hanzi_tutor::db::characters;
use hanzi_tutor::SharedState;
use helpers::*;
use http::{Method, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_server() -> (axum::Router, Arc<SharedState>, TestEnv) {
    let env = TestEnv::new(&[("木", 1), ("山", 1), ("人", 1)]).await;
    let state = Arc::new(SharedState::new(
        env.db.clone(),
        Arc::clone(&env.events),
        env.collaborators.clone(),
    ));
    let router = create_router(AppContext {
        state: Arc::clone(&state),
        port: 5760,
    });
    (router, state, env)
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn make_request(app: &axum::Router, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(path);
    let request = match body {
        Some(json_body) => builder
            .header("content-type", "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

async fn login_mei(app: &axum::Router) -> i64 {
    let (status, body) = make_request(
        app,
        Method::POST,
        "/api/v1/login",
        Some(json!({"name": "Mei", "avatar": "avatar_rarity", "grade": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["user"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _env) = setup_test_server().await;

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hanzi-tutor");
    assert_eq!(body["port"], 5760);
    assert_eq!(body["active_sessions"], 0);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_login_starts_session() {
    let (app, state, env) = setup_test_server().await;

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/v1/login",
        Some(json!({"name": "Mei", "avatar": "avatar_rarity", "grade": 1})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], env.user.id);
    assert_eq!(body["user"]["avatar"], "avatar_rarity");
    assert_eq!(body["session"]["phase"], "Presenting");
    assert_eq!(body["session"]["character"]["id"], "人");
    assert_eq!(state.session_count().await, 1);

    let (status, body) = make_request(&app, Method::GET, "/api/v1/users/recent", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], "Mei");
}

#[tokio::test]
async fn test_login_validation() {
    let (app, _, _env) = setup_test_server().await;

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/v1/login",
        Some(json!({"name": "Mei", "grade": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["status"].as_str().unwrap().starts_with("error:"));

    let (status, _) = make_request(
        &app,
        Method::POST,
        "/api/v1/login/recent",
        Some(json!({"user_id": 999, "grade": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recent_login_registers_new_grade() {
    let (app, _, env) = setup_test_server().await;

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/v1/login/recent",
        Some(json!({"user_id": env.user.id, "grade": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["current_grade"], 2);

    // Grade 2 is empty in this catalog
    assert_eq!(body["session"]["phase"], "AwaitingCharacterSelection");
    assert!(body["session"]["character"].is_null());
}

#[tokio::test]
async fn test_select_and_write() {
    let (app, state, env) = setup_test_server().await;
    let user_id = login_mei(&app).await;

    let (status, body) = make_request(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/select", user_id),
        Some(json!({"character_id": "木"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["character"]["id"], "木");
    assert_eq!(body["review"], false);

    env.recognizer.set(&["木"]);
    let (status, body) = make_request(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/ink", user_id),
        Some(json!({ "ink": serde_json::to_value(good_wood()).unwrap() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["generation"].as_u64().unwrap() > 0);

    state.session(user_id).await.unwrap().wait_for_evaluation().await;

    let (status, body) = make_request(&app, Method::GET, &format!("/api/v1/sessions/{}", user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["total_points"], 10);
    assert_eq!(body["learned"], json!(["木"]));
    assert_ne!(body["character"]["id"], "木");
}

#[tokio::test]
async fn test_unknown_character_and_session() {
    let (app, _, _env) = setup_test_server().await;
    let user_id = login_mei(&app).await;

    let (status, _) = make_request(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/select", user_id),
        Some(json!({"character_id": "龘"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = make_request(&app, Method::GET, "/api/v1/sessions/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Stopping a recording that never started
    let (status, _) = make_request(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/recording/stop", user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_pcm_upload_and_playback() {
    let (app, _, env) = setup_test_server().await;
    let user_id = login_mei(&app).await;

    let bytes: Vec<u8> = tone(1.0, 0.4).iter().flat_map(|s| s.to_le_bytes()).collect();
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/sessions/{}/recording/pcm", user_id))
        .header("content-type", "application/octet-stream")
        .body(Body::from(bytes))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stars"], 3);

    let (status, _) = make_request(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/recording/play", user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(env.audio.played(), vec![tone(1.0, 0.4)]);

    // Half a sample
    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/sessions/{}/recording/pcm", user_id))
        .body(Body::from(vec![1u8, 2, 3]))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_pronounce_current() {
    let (app, _, env) = setup_test_server().await;
    let user_id = login_mei(&app).await;

    let (status, body) = make_request(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/pronounce", user_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "人，人头");
    assert!(env.speech.spoken().contains(&"人，人头".to_string()));
}

#[tokio::test]
async fn test_logout() {
    let (app, state, _env) = setup_test_server().await;
    let user_id = login_mei(&app).await;

    let (status, body) = make_request(&app, Method::DELETE, &format!("/api/v1/sessions/{}", user_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(state.session_count().await, 0);

    let (status, _) = make_request(&app, Method::DELETE, &format!("/api/v1/sessions/{}", user_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_character_lookup_and_backfill() {
    let (app, _, env) = setup_test_server().await;

    let (status, body) = make_request(&app, Method::GET, "/api/v1/characters/%E6%9C%A8", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["character"]["grade"], 1);
    assert_eq!(body["reference"]["medians"].as_array().unwrap().len(), 2);

    let (status, body) = make_request(&app, Method::GET, "/api/v1/characters/%E5%B1%B1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reference"].is_null());

    let (status, _) = make_request(
        &app,
        Method::PUT,
        "/api/v1/characters/%E6%9C%A8/reading",
        Some(json!({"pinyin": "mù", "strokes": "[\"横\",\"竖\",\"撇\",\"点\"]"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let wood = characters::get_character(&env.db, "木").await.unwrap().unwrap();
    assert_eq!(wood.pinyin, "mù");

    let (status, _) = make_request(
        &app,
        Method::PUT,
        "/api/v1/characters/%E9%BE%98/reading",
        Some(json!({"pinyin": "dá"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
