#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::Value;
use tower::ServiceExt;

use todo_api_rust::database::models::Todo;
use todo_api_rust::database::DatabaseManager;
use todo_api_rust::middleware::{AccessRecord, AccessSink, Credentials, PanicResponse, PipelineState};
use todo_api_rust::services::{TodoError, TodoService, TodoStore};

pub const USER_ID: &str = "station";
pub const PASSWORD: &str = "hunter2";

/// Wraps a store and counts every call that reaches it
pub struct CountingStore<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<S: TodoStore> TodoStore for CountingStore<S> {
    async fn create(&self, subject: &str, description: &str) -> Result<Todo, TodoError> {
        self.hit();
        self.inner.create(subject, description).await
    }

    async fn read(&self, prev_id: i64, size: i64) -> Result<Vec<Todo>, TodoError> {
        self.hit();
        self.inner.read(prev_id, size).await
    }

    async fn update(&self, id: i64, subject: &str, description: &str) -> Result<Todo, TodoError> {
        self.hit();
        self.inner.update(id, subject, description).await
    }

    async fn delete(&self, ids: &[i64]) -> Result<(), TodoError> {
        self.hit();
        self.inner.delete(ids).await
    }
}

/// Collects access records in memory
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<AccessRecord>>,
}

impl RecordingSink {
    pub fn records(&self) -> Vec<AccessRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl AccessSink for RecordingSink {
    fn record(&self, access: AccessRecord) {
        self.records.lock().unwrap().push(access);
    }
}

/// In-process application over a fresh in-memory database
pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore<TodoService>>,
    pub sink: Arc<RecordingSink>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_panic_response(PanicResponse::Legacy).await
    }

    pub async fn with_panic_response(panic_response: PanicResponse) -> Self {
        let pool = DatabaseManager::in_memory().await.unwrap();
        DatabaseManager::migrate(&pool).await.unwrap();

        let store = Arc::new(CountingStore::new(TodoService::new(pool)));
        let sink = Arc::new(RecordingSink::default());

        let state = PipelineState::new(Some(Credentials::new(USER_ID, PASSWORD)))
            .with_access_sink(sink.clone())
            .with_panic_response(panic_response);

        let router = todo_api_rust::app(store.clone(), state);

        Self { router, store, sink }
    }

    /// Send a request and return status plus JSON body (Null when the body is empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn create(&self, subject: &str, description: &str) -> Value {
        let (status, body) = self
            .send(authed(
                "POST",
                "/todos",
                Some(serde_json::json!({ "subject": subject, "description": description })),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "create failed: {}", body);
        body["todo"].clone()
    }
}

pub fn basic_auth(user_id: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user_id, password)))
}

/// Request with valid credentials and an optional JSON body
pub fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    request(method, uri, Some(basic_auth(USER_ID, PASSWORD)), body)
}

pub fn request(
    method: &str,
    uri: &str,
    authorization: Option<String>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(authorization) = authorization {
        builder = builder.header(header::AUTHORIZATION, authorization);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Request with valid credentials and a raw, possibly malformed body
pub fn authed_raw(method: &str, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, basic_auth(USER_ID, PASSWORD))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

/// The compiled binary running on a free port against a throwaway database file
pub struct TestServer {
    pub base_url: String,
    child: Child,
    _dir: tempfile::TempDir,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let dir = tempfile::tempdir().context("failed to create temp dir")?;

        let child = Command::new(env!("CARGO_BIN_EXE_todo-api-rust"))
            .env("PORT", port.to_string())
            .env("DB_PATH", dir.path().join("todo.db"))
            .env("BASIC_AUTH_USER_ID", USER_ID)
            .env("BASIC_AUTH_PASSWORD", PASSWORD)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self {
            base_url,
            child,
            _dir: dir,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/healthz", self.base_url);
            // Any HTTP answer (401 included) means the listener is up
            if client.get(&url).send().await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
