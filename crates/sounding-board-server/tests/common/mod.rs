// Shared fixtures for the proxy integration tests
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use sounding_board_core::AzureSettings;
use sounding_board_server::{router, AppState};
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_DEPLOYMENT: &str = "test-deployment";

/// One request received by the mock completion endpoint
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub deployment: String,
    pub api_version: Option<String>,
    pub api_key: Option<String>,
    pub body: Value,
}

struct MockState {
    status: u16,
    body: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Stand-in for the Azure OpenAI chat-completions endpoint
pub struct MockUpstream {
    url: String,
    state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockUpstream {
    /// Serve `body` with `status` for every completion request
    pub async fn start(status: u16, body: impl Into<String>) -> Self {
        let state = Arc::new(MockState {
            status,
            body: body.into(),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(
                "/openai/deployments/:deployment/chat/completions",
                post(completions_handler),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock upstream error: {}", e);
            }
        });

        Self { url, state, handle }
    }

    /// Respond 200 with a single choice carrying `content`
    pub async fn replying(content: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        });
        Self::start(200, body.to_string()).await
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn call_count(&self) -> usize {
        self.state.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn settings(&self) -> AzureSettings {
        AzureSettings {
            endpoint: Some(self.url.clone()),
            api_key: Some(TEST_API_KEY.to_string()),
            deployment: Some(TEST_DEPLOYMENT.to_string()),
            system_prompt: None,
        }
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn completions_handler(
    State(state): State<Arc<MockState>>,
    Path(deployment): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        deployment,
        api_version: query.get("api-version").cloned(),
        api_key: headers
            .get("api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let status = StatusCode::from_u16(state.status).unwrap();
    (status, [(CONTENT_TYPE, "application/json")], state.body.clone()).into_response()
}

/// POST a raw body to `/api/chat` and return the status and decoded JSON
pub async fn post_chat(settings: AzureSettings, body: impl Into<String>) -> (StatusCode, Value) {
    let app = router(Arc::new(AppState::new(settings)));

    let req = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.into()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

/// A local port with nothing listening on it
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
