//! Integration tests for fixture files below the fixture root

mod common;

use axum::http::{Method, StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use common::{TestApp, assert_failure, ok_data};
use serde_json::json;

#[tokio::test]
async fn test_file_lifecycle() {
    let app = TestApp::new();

    ok_data(app.admin(Method::POST, "/dir", Some(json!({"dir": "/tmp"}))).await);
    let data = ok_data(
        app.admin(Method::POST, "/file", Some(json!({"file": "/tmp/x.txt", "content": "hello"})))
            .await,
    );
    assert_eq!(data, json!({"file": "/tmp/x.txt", "size": 5}));
    assert_eq!(
        std::fs::read_to_string(app.fixtures().join("tmp/x.txt")).unwrap(),
        "hello"
    );

    let data = ok_data(app.admin(Method::GET, "/file?file=/tmp/x.txt", None).await);
    assert_eq!(
        data,
        json!({"file": "/tmp/x.txt", "content": "hello", "encoding": "utf-8"})
    );

    ok_data(app.admin(Method::DELETE, "/file?file=/tmp/x.txt", None).await);
    assert_failure(
        app.admin(Method::GET, "/file?file=/tmp/x.txt", None).await,
        StatusCode::NOT_FOUND,
    );
}

#[tokio::test]
async fn test_directories() {
    let app = TestApp::new();

    ok_data(app.admin(Method::POST, "/dir", Some(json!({"dir": "b"}))).await);
    ok_data(app.admin(Method::POST, "/dir", Some(json!({"dir": "a/nested"}))).await);

    let data = ok_data(app.admin(Method::GET, "/dir", None).await);
    assert_eq!(data, json!(["a", "b"]));
    let data = ok_data(app.admin(Method::GET, "/dir?dir=a", None).await);
    assert_eq!(data, json!(["nested"]));

    ok_data(app.admin(Method::DELETE, "/dir?dir=b", None).await);
    let data = ok_data(app.admin(Method::GET, "/dir", None).await);
    assert_eq!(data, json!(["a"]));

    assert_failure(
        app.admin(Method::GET, "/dir?dir=missing", None).await,
        StatusCode::NOT_FOUND,
    );
}

#[tokio::test]
async fn test_paths_stay_below_the_root() {
    let app = TestApp::new();

    assert_failure(
        app.admin(Method::GET, "/file?file=../host.db", None).await,
        StatusCode::BAD_REQUEST,
    );
    assert_failure(
        app.admin(
            Method::POST,
            "/file",
            Some(json!({"file": "a/../../escape.txt", "content": "x"})),
        )
        .await,
        StatusCode::BAD_REQUEST,
    );
    assert_failure(
        app.admin(Method::DELETE, "/dir?dir=/", None).await,
        StatusCode::BAD_REQUEST,
    );
    assert!(!app.base.join("escape.txt").exists());
}

#[tokio::test]
async fn test_binary_content_uses_base64() {
    let app = TestApp::new();
    let bytes = [0xff_u8, 0xfe, 0x00, 0x41];
    let encoded = STANDARD.encode(bytes);

    let data = ok_data(
        app.admin(
            Method::POST,
            "/file",
            Some(json!({"file": "blob.bin", "content": encoded, "encoding": "base64"})),
        )
        .await,
    );
    assert_eq!(data["size"], 4);
    assert_eq!(std::fs::read(app.fixtures().join("blob.bin")).unwrap(), bytes);

    let data = ok_data(app.admin(Method::GET, "/file?file=blob.bin", None).await);
    assert_eq!(data["encoding"], "base64");
    assert_eq!(data["content"], encoded);

    assert_failure(
        app.admin(
            Method::POST,
            "/file",
            Some(json!({"file": "bad.bin", "content": "!!!", "encoding": "base64"})),
        )
        .await,
        StatusCode::BAD_REQUEST,
    );
}

#[tokio::test]
async fn test_missing_parameters() {
    let app = TestApp::new();
    assert_failure(
        app.admin(Method::POST, "/file", Some(json!({"content": "x"}))).await,
        StatusCode::BAD_REQUEST,
    );
    assert_failure(
        app.admin(Method::POST, "/dir", None).await,
        StatusCode::BAD_REQUEST,
    );
}
