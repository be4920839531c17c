//! JSON-over-HTTP transport shared by both flows
//!
//! One POST per call: no retries, no client-side timeout, no cancellation.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

/// Trait for a single request/response exchange
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `endpoint` and parse the JSON reply
    async fn send(&self, endpoint: &str, body: Value) -> Result<Value>;
}

/// Reusable HTTP transport (connection-pooled)
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; paths are joined onto the base URL
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, endpoint: &str, body: Value) -> Result<Value> {
        let url = self.url_for(endpoint);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, "Request failed: {}", e);
                ClientError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = status.as_u16(), "Error response: {}", body);
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(|e| {
            error!(url = %url, "Failed to read response body: {}", e);
            ClientError::Network(e)
        })?;

        serde_json::from_str(&text).map_err(|e| {
            error!(url = %url, "Failed to parse response: {}", e);
            ClientError::Decode(e)
        })
    }
}

/// Scripted transport double for flow tests
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    pub(crate) enum Reply {
        Ready(Result<Value>),
        /// Resolves when the test sends on the paired channel
        Gated(oneshot::Receiver<Result<Value>>),
    }

    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        requests: Mutex<Vec<(String, Value)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn reply(self, reply: Result<Value>) -> Self {
            self.push(Reply::Ready(reply));
            self
        }

        pub(crate) fn push(&self, reply: Reply) {
            self.replies.lock().unwrap().push_back(reply);
        }

        /// Queue a reply the test releases later
        pub(crate) fn gate(&self) -> oneshot::Sender<Result<Value>> {
            let (tx, rx) = oneshot::channel();
            self.push(Reply::Gated(rx));
            tx
        }

        pub(crate) fn requests(&self) -> Vec<(String, Value)> {
            self.requests.lock().unwrap().clone()
        }

        pub(crate) fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, endpoint: &str, body: Value) -> Result<Value> {
            self.requests
                .lock()
                .unwrap()
                .push((endpoint.to_string(), body));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let reply = self.replies.lock().unwrap().pop_front();
            let result = match reply {
                Some(Reply::Ready(result)) => result,
                Some(Reply::Gated(rx)) => rx.await.unwrap_or_else(|_| {
                    Err(ClientError::InvalidResponse("gate dropped".to_string()))
                }),
                None => Err(ClientError::InvalidResponse("no scripted reply".to_string())),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    /// Stub service on an ephemeral port; returns its base URL
    async fn spawn_stub() -> String {
        let app = Router::new()
            // Json extractor answers 415 unless the request is application/json
            .route(
                "/predict",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({ "loan_approved": true, "echo": body }))
                }),
            )
            .route(
                "/broken",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "model offline") }),
            )
            .route("/garbage", post(|| async { "<html>oops</html>" }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    fn transport_for(base_url: &str) -> HttpTransport {
        let config = ClientConfig {
            backend_url: base_url.to_string(),
            ..ClientConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[test]
    fn test_url_joining() {
        let transport = transport_for("http://loans.local:8000/");
        assert_eq!(transport.base_url(), "http://loans.local:8000");
        assert_eq!(transport.url_for("/predict"), "http://loans.local:8000/predict");
        assert_eq!(transport.url_for("chat"), "http://loans.local:8000/chat");
        assert_eq!(
            transport.url_for("https://other.example.com/chat"),
            "https://other.example.com/chat"
        );
    }

    #[tokio::test]
    async fn test_posts_json_and_parses_reply() {
        let transport = transport_for(&spawn_stub().await);

        let reply = transport
            .send("/predict", json!({ "avg_credit_score": 720.0 }))
            .await;
        let reply = assert_ok!(reply);

        assert_eq!(reply["loan_approved"], json!(true));
        assert_eq!(reply["echo"]["avg_credit_score"], json!(720.0));
    }

    #[tokio::test]
    async fn test_non_success_status_is_captured() {
        let transport = transport_for(&spawn_stub().await);

        let err = assert_err!(transport.send("/broken", json!({})).await);
        match err {
            ClientError::HttpStatus { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "model offline");
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let transport = transport_for(&spawn_stub().await);

        let err = assert_err!(transport.send("/garbage", json!({})).await);
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Grab a free port, then close it again
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = transport_for(&format!("http://{}", addr));
        let err = assert_err!(transport.send("/chat", json!({ "message": "hi" })).await);
        assert!(matches!(err, ClientError::Network(_)));
    }
}
