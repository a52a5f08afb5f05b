//! API integration tests
//! Full HTTP request/response cycles against a scripted converter and engine
mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{file, multipart_body, text, Part, TestApp};
use std::path::{Path, PathBuf};
use tower::util::ServiceExt;

fn analyze_request(parts: &[Part<'_>]) -> Request<Body> {
    let (content_type, body) = multipart_body(parts);
    Request::builder()
        .uri("/api/pronunciation/analyze")
        .method("POST")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn missing_converter(dir: &Path) -> PathBuf {
    dir.join("no-such-ffmpeg")
}

#[tokio::test]
async fn test_health_reports_degraded_without_converter() {
    let app = TestApp::with_converter(missing_converter);

    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["converterAvailable"], false);
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_missing_audio_file_is_bad_request() {
    let app = TestApp::with_converter(missing_converter);

    let response = app
        .router()
        .oneshot(analyze_request(&[text("lang", "en")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Missing audioFile");
    assert!(json["timestamp"].as_i64().is_some());
}

#[tokio::test]
async fn test_empty_audio_file_is_bad_request() {
    let app = TestApp::with_converter(missing_converter);

    let response = app
        .router()
        .oneshot(analyze_request(&[file("audioFile", "clip.webm", b"")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_language_is_bad_request() {
    let app = TestApp::with_converter(missing_converter);

    let response = app
        .router()
        .oneshot(analyze_request(&[
            file("audioFile", "clip.webm", b"bytes"),
            text("lang", "xx"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_multipart_body_is_bad_request() {
    let app = TestApp::with_converter(missing_converter);

    let request = Request::builder()
        .uri("/api/pronunciation/analyze")
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_converter_is_service_unavailable() {
    let app = TestApp::with_converter(missing_converter);

    let response = app
        .router()
        .oneshot(analyze_request(&[file("audioFile", "clip.webm", b"bytes")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(app.residue().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = TestApp::with_converter(missing_converter);
    let big = vec![0_u8; app.config.upload.max_bytes + 1];

    let response = app
        .router()
        .oneshot(analyze_request(&[file("audioFile", "clip.webm", &big)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[cfg(unix)]
#[tokio::test]
async fn test_analyze_success_returns_scored_result() {
    let app = TestApp::with_converter(|dir| common::fake_converter(dir, 0));
    let engine = app.spawn_engine(r#"{"status":"success","score":4.2,"timestamp":1234}"#);
    let clip = common::wav_bytes();

    let response = app
        .router()
        .oneshot(analyze_request(&[
            file("audioFile", "clip.wav", &clip),
            text("lang", "de"),
            text("text", "Guten Morgen"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["score"], 4.2);
    assert_eq!(json["status"], "success");
    assert_eq!(json["scoreGrade"], "B");
    assert_eq!(json["success"], true);
    assert_eq!(json["targetText"], "Guten Morgen");
    assert_eq!(json["analysisDetails"]["language"], "de");

    assert!(engine.await.unwrap());
    assert!(app.residue().is_empty(), "{:?}", app.residue());
}

#[cfg(unix)]
#[tokio::test]
async fn test_engine_error_is_bad_gateway() {
    let app = TestApp::with_converter(|dir| common::fake_converter(dir, 0));
    app.spawn_engine(r#"{"status":"error","error":"model failure","timestamp":1}"#);

    let response = app
        .router()
        .oneshot(analyze_request(&[file("audioFile", "clip.wav", &common::wav_bytes())]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("model failure"));
    assert!(app.residue().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_silent_engine_is_gateway_timeout() {
    let app = TestApp::with_converter(|dir| common::fake_converter(dir, 0));

    let response = app
        .router()
        .oneshot(analyze_request(&[file("audioFile", "clip.wav", &common::wav_bytes())]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert!(app.residue().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_conversion_failure_is_unprocessable() {
    let app = TestApp::with_converter(|dir| common::fake_converter(dir, 1));

    let response = app
        .router()
        .oneshot(analyze_request(&[file("audioFile", "clip.webm", b"garbage")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.residue().is_empty());
}
