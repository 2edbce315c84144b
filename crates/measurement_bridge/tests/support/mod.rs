//! In-process stand-in for the Exist.io attribute update endpoint.

#![allow(dead_code)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const UPDATE_PATH: &str = "/api/2/attributes/update/";

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Clone, Default)]
pub struct ExistStub {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    delay: Duration,
}

impl ExistStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a response; once the queue is empty every call gets 200 with no failures
    pub fn respond_with(self, status: StatusCode, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back((status, body.into()));
        self
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Serve on an ephemeral port and return the full update URL
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route(UPDATE_PATH, post(update_attributes))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}{}", addr, UPDATE_PATH)
    }
}

async fn update_attributes(
    State(stub): State<ExistStub>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    stub.requests.lock().unwrap().push(CapturedRequest {
        authorization: header("authorization"),
        content_type: header("content-type"),
        body,
    });

    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }

    let queued = stub.responses.lock().unwrap().pop_front();
    queued.unwrap_or_else(|| {
        (
            StatusCode::OK,
            r#"{"success":[],"failed":[]}"#.to_string(),
        )
    })
}
