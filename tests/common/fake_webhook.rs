//! Fake push-service endpoint for integration tests.
//!
//! Spins up a minimal `axum` HTTP server on a random TCP port bound to
//! 127.0.0.1. Every request, whatever its path, is recorded and answered
//! with a JSON body that satisfies all webhook-style channels
//! (`{"code":0,"errcode":0,"ok":true}`) unless a path is told otherwise.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::IntoResponse,
};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
struct Reply {
    status: StatusCode,
    body: String,
}

#[derive(Default)]
struct HookState {
    requests: Vec<Recorded>,
    /// Reply for every call to a path
    replies: HashMap<String, Reply>,
    /// Reply for the n-th (1-based) call to a path
    nth_replies: HashMap<(String, usize), Reply>,
    calls: HashMap<String, usize>,
}

/// Handle to the running fake server.
pub struct FakeWebhook {
    addr: SocketAddr,
    state: Arc<Mutex<HookState>>,
}

const OK_BODY: &str = r#"{"code":0,"errcode":0,"ok":true}"#;

impl FakeWebhook {
    /// Start the server on a random port. Returns once it is listening.
    pub async fn start() -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(HookState::default()));

        let app = Router::new().fallback(record).with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the task a moment to register.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        Ok(Self { addr, state })
    }

    /// Base URL (e.g. `http://127.0.0.1:PORT`).
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full URL of a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Answer every request to `path` with `status` and `body`.
    pub async fn reply(&self, path: &str, status: u16, body: &str) {
        self.state.lock().await.replies.insert(
            path.to_string(),
            Reply {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.to_string(),
            },
        );
    }

    /// Answer only the `nth` (1-based) request to `path` with `status`.
    pub async fn reply_nth(&self, path: &str, nth: usize, status: u16, body: &str) {
        self.state.lock().await.nth_replies.insert(
            (path.to_string(), nth),
            Reply {
                status: StatusCode::from_u16(status).unwrap(),
                body: body.to_string(),
            },
        );
    }

    /// Requests received so far, in arrival order.
    pub async fn requests(&self) -> Vec<Recorded> {
        self.state.lock().await.requests.clone()
    }

    /// Requests received on one path.
    pub async fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }
}

async fn record(
    State(state): State<Arc<Mutex<HookState>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let mut state = state.lock().await;
    let path = uri.path().to_string();

    let call = {
        let count = state.calls.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };
    let reply = state
        .nth_replies
        .get(&(path.clone(), call))
        .or_else(|| state.replies.get(&path))
        .cloned()
        .unwrap_or(Reply {
            status: StatusCode::OK,
            body: OK_BODY.to_string(),
        });

    state.requests.push(Recorded {
        method,
        path,
        headers,
        body,
    });

    (
        reply.status,
        [(header::CONTENT_TYPE, "application/json")],
        reply.body,
    )
}
