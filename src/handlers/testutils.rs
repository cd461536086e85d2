//! Test context: the full router over an in-memory store and the bundled descriptors.

use crate::config::{load_from_str, resolve, ResolvedResource, BUNDLED_RESOURCES};
use crate::routes::app;
use crate::settings::DEFAULT_BODY_LIMIT;
use crate::state::AppState;
use crate::store::memory::MemoryStore;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tower::ServiceExt;

pub(crate) struct TestContext {
    app: Router,
    pub(crate) store: MemoryStore,
    state: AppState,
}

impl TestContext {
    pub(crate) fn setup() -> Self {
        Self::with_body_limit(DEFAULT_BODY_LIMIT)
    }

    pub(crate) fn with_body_limit(limit: usize) -> Self {
        let model = resolve(&load_from_str(BUNDLED_RESOURCES).unwrap()).unwrap();
        let store = MemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()), model);
        TestContext {
            app: app(state.clone(), limit),
            store,
            state,
        }
    }

    pub(crate) fn resource(&self, path: &str) -> Arc<ResolvedResource> {
        Arc::clone(self.state.model.resource(path).unwrap())
    }

    pub(crate) fn resources(&self) -> Vec<Arc<ResolvedResource>> {
        self.state.model.resources.clone()
    }

    /// Insert a row straight into the store and return its id.
    pub(crate) fn seed(&self, path: &str, row: Value) -> i64 {
        self.store.seed(&self.resource(path), row)
    }

    /// Statements that reached the store so far.
    pub(crate) fn statements(&self) -> usize {
        self.store.counters().statements.load(Ordering::SeqCst)
    }

    pub(crate) async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(v) => request
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub(crate) async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };
        (status, body)
    }

    pub(crate) async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub(crate) async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub(crate) async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    pub(crate) async fn delete(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(body)).await
    }
}
