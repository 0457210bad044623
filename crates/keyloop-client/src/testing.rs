//! Test utilities for keyloop-client
//!
//! [`TestServer`] runs any axum router on an ephemeral port. [`MockUpstream`]
//! is a scriptable stand-in for the Keyloop API that records every request
//! it receives.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use keyloop_core::{ConfigError, Credentials};
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::Result;

/// Path of the upstream token endpoint
pub const TOKEN_PATH: &str = "/oauth/client_credential/accesstoken";

/// Token issued by [`MockUpstream`] when no token response is scripted
pub const DEFAULT_TEST_TOKEN: &str = "test-token";

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Serve an axum Router on 127.0.0.1 with an OS-assigned port
    pub async fn start<S>(router: axum::Router<S>) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let router: axum::Router = router.into();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Credentials pointing at this server, with enterprise `ent` and store `store`
    pub fn credentials(&self) -> std::result::Result<Credentials, ConfigError> {
        Credentials::new(self.base_url(), "test-client", "test-secret", "ent", "store")
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// A scripted upstream answer
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
    pub delay: Option<Duration>,
}

impl CannedResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: None,
        }
    }

    /// Hold the answer back for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// One request as seen by [`MockUpstream`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct MockState {
    // Served in order; the last one repeats
    routes: HashMap<(String, String), Vec<CannedResponse>>,
    served: HashMap<(String, String), usize>,
    requests: Vec<RecordedRequest>,
}

/// In-process fake of the Keyloop API.
///
/// Paths are matched exactly (query ignored). The token endpoint answers
/// `{"access_token": "test-token"}` unless scripted otherwise; any other
/// unscripted path answers 404 with an empty body.
#[derive(Clone, Default)]
pub struct MockUpstream {
    state: Arc<Mutex<MockState>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next answer for `method path`
    pub fn on(&self, method: Method, path: &str, response: CannedResponse) -> &Self {
        self.state
            .lock()
            .routes
            .entry((method.to_string(), path.to_string()))
            .or_default()
            .push(response);
        self
    }

    pub fn on_get(&self, path: &str, response: CannedResponse) -> &Self {
        self.on(Method::GET, path, response)
    }

    pub fn on_post(&self, path: &str, response: CannedResponse) -> &Self {
        self.on(Method::POST, path, response)
    }

    /// Script the token endpoint
    pub fn on_token(&self, response: CannedResponse) -> &Self {
        self.on_post(TOKEN_PATH, response)
    }

    /// Every request received so far, in arrival order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests received for `path`
    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Number of requests received for `path`
    pub fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    /// Number of requests that were not token exchanges
    pub fn api_call_count(&self) -> usize {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| r.path != TOKEN_PATH)
            .count()
    }

    pub fn router(&self) -> axum::Router {
        axum::Router::new()
            .fallback(handle_mock_request)
            .with_state(self.clone())
    }

    /// Start serving on an ephemeral port
    pub async fn start(&self) -> Result<TestServer> {
        TestServer::start(self.router()).await
    }

    fn next_response(&self, request: RecordedRequest) -> Option<CannedResponse> {
        let mut state = self.state.lock();
        let key = (request.method.clone(), request.path.clone());
        state.requests.push(request);

        let index = {
            let served = state.served.entry(key.clone()).or_insert(0);
            let index = *served;
            *served += 1;
            index
        };

        match state.routes.get(&key) {
            Some(responses) if !responses.is_empty() => {
                let last = responses.len() - 1;
                Some(responses[index.min(last)].clone())
            }
            _ if key.0 == "POST" && key.1 == TOKEN_PATH => Some(CannedResponse::json(
                200,
                serde_json::json!({ "access_token": DEFAULT_TEST_TOKEN }),
            )),
            _ => None,
        }
    }
}

async fn handle_mock_request(
    State(mock): State<MockUpstream>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let header_text = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let recorded = RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: header_text(header::AUTHORIZATION),
        content_type: header_text(header::CONTENT_TYPE),
        body,
    };

    let Some(canned) = mock.next_response(recorded) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(delay) = canned.delay {
        tokio::time::sleep(delay).await;
    }

    let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_responses_repeat_last() {
        let mock = MockUpstream::new();
        mock.on_get("/x", CannedResponse::text(500, "first"))
            .on_get("/x", CannedResponse::text(200, "second"));

        let record = |path: &str| RecordedRequest {
            method: "GET".into(),
            path: path.into(),
            query: None,
            authorization: None,
            content_type: None,
            body: String::new(),
        };

        assert_eq!(mock.next_response(record("/x")).unwrap().status, 500);
        assert_eq!(mock.next_response(record("/x")).unwrap().status, 200);
        assert_eq!(mock.next_response(record("/x")).unwrap().status, 200);
        assert!(mock.next_response(record("/y")).is_none());
        assert_eq!(mock.count("/x"), 3);
        assert_eq!(mock.api_call_count(), 4);
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let server = MockUpstream::new().start().await.unwrap();
        assert_ne!(server.addr.port(), 0);
        assert!(server.base_url().starts_with("http://127.0.0.1:"));
        let creds = server.credentials().unwrap();
        assert_eq!(creds.store_id(), "store");
        server.shutdown().await;
    }
}
