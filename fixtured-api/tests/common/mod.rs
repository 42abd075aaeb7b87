//! Common test utilities for integration tests
//!
//! `TestApp` builds the full router on a temporary host layout and drives it
//! with `tower::ServiceExt::oneshot`, so no socket is involved. Command
//! execution and environment probes are replaced by in-memory fakes.

#![allow(dead_code)]

pub mod tcp_harness;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use camino::Utf8PathBuf;
use fixtured_api::{AppState, build_router};
use fixtured_core::command::{CommandOutput, CommandRunner};
use fixtured_core::config::Config;
use fixtured_core::error::Result as CoreResult;
use fixtured_core::probe::EnvironmentProbe;
use fixtured_core::test_utils::{TEST_ADMIN, TEST_USER, test_config};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BASE: &str = "/apps/testing/api/v1";

pub type Credentials = (&'static str, &'static str);

pub const ADMIN: Credentials = TEST_ADMIN;
pub const USER: Credentials = TEST_USER;

/// Runner that echoes its argv. A first word of `fail` exits with 1.
#[derive(Default)]
pub struct EchoRunner {
    pub calls: Mutex<Vec<(Vec<String>, BTreeMap<String, String>)>>,
}

#[async_trait]
impl CommandRunner for EchoRunner {
    async fn run(&self, argv: &[String], env: &BTreeMap<String, String>) -> CoreResult<CommandOutput> {
        self.calls.lock().unwrap().push((argv.to_vec(), env.clone()));

        let failed = argv.first().is_some_and(|w| w == "fail");
        Ok(CommandOutput {
            exit_code: if failed { 1 } else { 0 },
            stdout: argv.join(" "),
            stderr: if failed { "command failed".to_string() } else { String::new() },
        })
    }
}

/// Probe with a fixed module list
pub struct StaticProbe {
    pub modules: Vec<String>,
    pub opcache: bool,
}

#[async_trait]
impl EnvironmentProbe for StaticProbe {
    async fn loaded_modules(&self) -> CoreResult<Vec<String>> {
        Ok(self.modules.clone())
    }

    async fn reset_opcache(&self) -> CoreResult<bool> {
        Ok(self.opcache)
    }
}

pub struct TestApp {
    pub dir: TempDir,
    pub base: Utf8PathBuf,
    pub state: AppState,
    pub runner: Arc<EchoRunner>,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(|_| {})
    }

    /// Build the app after letting `adjust` change the test configuration
    pub fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().unwrap();
        let base = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

        let mut config = test_config(&base);
        adjust(&mut config);

        let runner = Arc::new(EchoRunner::default());
        let probe = StaticProbe {
            modules: vec!["rewrite".to_string(), "headers".to_string()],
            opcache: true,
        };

        let mut state = AppState::from_config(config)
            .unwrap()
            .with_probe(Arc::new(probe));
        if state.config.occ.enabled {
            state = state.with_command_runner(runner.clone());
        }

        Self {
            router: build_router(state.clone()),
            dir,
            base,
            state,
            runner,
        }
    }

    /// Send a request to `path` below the base path with a JSON body
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        credentials: Option<Credentials>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(format!("{BASE}{path}"));
        if let Some((name, password)) = credentials {
            builder = builder.header(header::AUTHORIZATION, basic_auth(name, password));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    /// Send a form encoded request as an administrator
    pub async fn call_form(&self, method: Method, path: &str, form: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(format!("{BASE}{path}"))
            .header(header::AUTHORIZATION, basic_auth(ADMIN.0, ADMIN.1))
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Send a raw body as an administrator
    pub async fn call_raw(&self, method: Method, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(format!("{BASE}{path}"))
            .header(header::AUTHORIZATION, basic_auth(ADMIN.0, ADMIN.1))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    pub async fn admin(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(method, path, Some(ADMIN), body).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    /// Fixture root on disk
    pub fn fixtures(&self) -> Utf8PathBuf {
        self.base.join("fixtures")
    }
}

pub fn basic_auth(name: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{name}:{password}")))
}

/// Assert the envelope of a successful response and return its data
pub fn ok_data(response: (StatusCode, Value)) -> Value {
    let (status, body) = response;
    assert_eq!(status, StatusCode::OK, "unexpected response: {body}");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["statusCode"], 200);
    body["data"].clone()
}

/// Assert a failure envelope with the given status
pub fn assert_failure(response: (StatusCode, Value), expected: StatusCode) {
    let (status, body) = response;
    assert_eq!(status, expected, "unexpected response: {body}");
    assert_eq!(body["status"], "failure");
    assert_eq!(body["statusCode"], expected.as_u16());
    assert!(body["message"].is_string());
}
