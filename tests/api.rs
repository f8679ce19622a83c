//! API endpoint integration tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{answer, responses_reply, test_state, JPEG_B64};

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn check_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/check")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn image_body() -> String {
    json!({ "image": format!("data:image/jpeg;base64,{JPEG_B64}") }).to_string()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(None, dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "Posture Guardian");
}

#[tokio::test]
async fn test_check_passes_model_qualification_through() {
    let dir = tempfile::tempdir().unwrap();
    // Inconsistent with the rubric on purpose: score 60 but qualified
    let reply = responses_reply(&answer("normal", 60, true, ""));
    let (state, speech) = test_state(Some(reply), dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(app, check_request(&image_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["score"], 60);
    assert_eq!(json["is_qualified"], true);
    assert!(json["audio"].is_null());
    assert_eq!(json["raw_result"]["status"], "normal");
    assert_eq!(speech.calls(), 0);
}

#[tokio::test]
async fn test_check_unqualified_posture_returns_audio() {
    let dir = tempfile::tempdir().unwrap();
    let reply = responses_reply(&answer("normal", 58, false, "坐直一点，眼睛离书远一点哦"));
    let (state, speech) = test_state(Some(reply), dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(app, check_request(&image_body())).await;

    assert_eq!(status, StatusCode::OK);
    let score = json["score"].as_u64().unwrap();
    assert!(score <= 100);
    assert_eq!(json["is_qualified"], false);
    assert_eq!(json["issues"], json!(["背部前倾"]));
    assert!(!json["audio"].as_str().unwrap().is_empty());
    assert_eq!(speech.calls(), 1);
}

#[tokio::test]
async fn test_check_no_person_has_no_audio() {
    let dir = tempfile::tempdir().unwrap();
    let reply = responses_reply(&answer("no_person", 0, false, "快回到座位上吧"));
    let (state, speech) = test_state(Some(reply), dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(app, check_request(&image_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "no_person");
    assert!(json["audio"].is_null());
    assert_eq!(speech.calls(), 0);
}

#[tokio::test]
async fn test_check_fenced_model_output() {
    let dir = tempfile::tempdir().unwrap();
    let fenced = format!("```json\n{}\n```", answer("not_writing", 0, false, ""));
    let reply = json!({"output": [{"type": "output_text", "text": fenced}]});
    let (state, _) = test_state(Some(reply), dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(app, check_request(&image_body())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "not_writing");
}

#[tokio::test]
async fn test_check_rejects_malformed_body() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(None, dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(app, check_request("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid JSON");
}

#[tokio::test]
async fn test_check_rejects_missing_image() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(None, dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(app, check_request(r#"{"image": ""}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No image provided");
}

#[tokio::test]
async fn test_check_vision_failure_returns_safe_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(None, dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(app, check_request(&image_body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["score"], 0);
    assert_eq!(json["is_qualified"], false);
    assert!(json["audio"].is_null());
    assert_eq!(json["issues"].as_array().unwrap().len(), 1);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_records_lists_saved_detections() {
    let dir = tempfile::tempdir().unwrap();
    let reply = responses_reply(&answer("normal", 88, true, ""));
    let (state, _) = test_state(Some(reply), dir.path());
    let app = posture_guardian::api::router(state);

    let (status, _) = send(app.clone(), check_request(&image_body())).await;
    assert_eq!(status, StatusCode::OK);

    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    let (status, json) = send(
        app,
        Request::builder()
            .uri(format!("/api/records?date={today}&limit=10"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    let record = &json["records"][0];
    assert_eq!(record["date"], today);
    assert_eq!(record["api_response"]["parsed_result"]["score"], 88);
    assert_eq!(record["api_response"]["full_api_response"]["id"], "resp_test");
}

#[tokio::test]
async fn test_records_rejects_bad_date() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(None, dir.path());
    let app = posture_guardian::api::router(state);

    let (status, json) = send(
        app,
        Request::builder()
            .uri("/api/records?date=14-03-2025")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("14-03-2025"));
}

#[tokio::test]
async fn test_index_page() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(None, dir.path());
    let app = posture_guardian::api::router(state);

    let missing = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    std::fs::create_dir_all(dir.path().join("static")).unwrap();
    std::fs::write(dir.path().join("static/index.html"), "<h1>guardian</h1>").unwrap();

    let found = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let body = axum::body::to_bytes(found.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"<h1>guardian</h1>");
}
