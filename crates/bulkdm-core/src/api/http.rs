use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    ApiResponse, DashboardApi, LoginRequest, SendData, SendMessagesRequest, StatusResponse,
    UploadData, UploadUsernamesRequest, LOGIN_PATH, LOGOUT_PATH, SEND_MESSAGES_PATH, STATUS_PATH,
    UPLOAD_USERNAMES_PATH,
};
use crate::error::ApiError;

/// reqwest-backed [`DashboardApi`].
///
/// The backend keeps its own session keyed by cookie, so the client carries a
/// cookie store for as long as it lives. No client-side timeout is set.
#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
}

impl HttpApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "backend request");
        self.client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send and decode the body whatever the HTTP status; the backend reports
    /// failures in-band.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(%status, url = %response.url(), "backend answered with non-success status");
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            warn!(%status, error = %e, "could not decode backend response");
            ApiError::Malformed(e.to_string())
        })
    }
}

#[async_trait]
impl DashboardApi for HttpApiClient {
    async fn status(&self) -> Result<StatusResponse, ApiError> {
        self.execute(self.request(Method::GET, STATUS_PATH)).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<serde_json::Value>, ApiError> {
        self.execute(self.request(Method::POST, LOGIN_PATH).json(request))
            .await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let _: serde_json::Value = self.execute(self.request(Method::POST, LOGOUT_PATH)).await?;
        Ok(())
    }

    async fn upload_usernames(
        &self,
        request: &UploadUsernamesRequest,
    ) -> Result<ApiResponse<UploadData>, ApiError> {
        self.execute(self.request(Method::POST, UPLOAD_USERNAMES_PATH).json(request))
            .await
    }

    async fn send_messages(
        &self,
        request: &SendMessagesRequest,
    ) -> Result<ApiResponse<SendData>, ApiError> {
        self.execute(self.request(Method::POST, SEND_MESSAGES_PATH).json(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::sync::{oneshot, Mutex};

    #[derive(Clone, Default)]
    struct StubState {
        calls: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
    }

    struct BackendStub {
        base_url: String,
        state: StubState,
        shutdown: Option<oneshot::Sender<()>>,
    }

    impl Drop for BackendStub {
        fn drop(&mut self) {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
        }
    }

    async fn record(state: &StubState, name: &str, headers: &HeaderMap, body: Value) {
        let content_type = headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        state.calls.lock().await.push((name.to_string(), content_type, body));
    }

    async fn start_stub() -> BackendStub {
        let state = StubState::default();

        let app = Router::new()
            .route(
                "/api/status",
                get(|State(s): State<StubState>, headers: HeaderMap| async move {
                    record(&s, "status", &headers, Value::Null).await;
                    Json(json!({"is_logged_in": true, "username": "brand_account"}))
                }),
            )
            .route(
                "/api/login",
                post(
                    |State(s): State<StubState>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        record(&s, "login", &headers, body).await;
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"success": false, "message": "Invalid credentials"})),
                        )
                    },
                ),
            )
            .route(
                "/api/logout",
                post(|State(s): State<StubState>, headers: HeaderMap| async move {
                    record(&s, "logout", &headers, Value::Null).await;
                    Json(json!({}))
                }),
            )
            .route(
                "/api/upload-usernames",
                post(
                    |State(s): State<StubState>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        record(&s, "upload", &headers, body).await;
                        Json(json!({"success": true, "data": {"count": 2}}))
                    },
                ),
            )
            .route(
                "/api/send-messages",
                post(
                    |State(s): State<StubState>, headers: HeaderMap, Json(body): Json<Value>| async move {
                        record(&s, "send", &headers, body).await;
                        (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
                    },
                ),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        BackendStub {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    #[tokio::test]
    async fn status_decodes_logged_in_user() {
        let stub = start_stub().await;
        let client = HttpApiClient::new(&stub.base_url).expect("client");

        let status = client.status().await.expect("status");

        assert!(status.is_logged_in);
        assert_eq!(status.username.as_deref(), Some("brand_account"));
        let calls = stub.state.calls.lock().await;
        assert_eq!(calls[0].1.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn login_failure_is_decoded_from_non_success_status() {
        let stub = start_stub().await;
        let client = HttpApiClient::new(&stub.base_url).expect("client");
        let request = LoginRequest {
            username: "brand_account".into(),
            password: "hunter2".into(),
        };

        let response = client.login(&request).await.expect("decoded envelope");

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Invalid credentials"));
        let calls = stub.state.calls.lock().await;
        assert_eq!(calls[0].0, "login");
        assert_eq!(
            calls[0].2,
            json!({"username": "brand_account", "password": "hunter2"})
        );
    }

    #[tokio::test]
    async fn upload_sends_raw_text_and_reads_count() {
        let stub = start_stub().await;
        let client = HttpApiClient::new(&format!("{}/", stub.base_url)).expect("client");
        let request = UploadUsernamesRequest {
            usernames: "alice\nbob".into(),
        };

        let count = client
            .upload_usernames(&request)
            .await
            .expect("envelope")
            .into_data()
            .expect("data")
            .count;

        assert_eq!(count, 2);
        let calls = stub.state.calls.lock().await;
        assert_eq!(calls[0].2, json!({"usernames": "alice\nbob"}));
    }

    #[tokio::test]
    async fn logout_posts_with_json_content_type() {
        let stub = start_stub().await;
        let client = HttpApiClient::new(&stub.base_url).expect("client");

        client.logout().await.expect("logout");

        let calls = stub.state.calls.lock().await;
        assert_eq!(calls[0].0, "logout");
        assert_eq!(calls[0].1.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let stub = start_stub().await;
        let client = HttpApiClient::new(&stub.base_url).expect("client");
        let request = SendMessagesRequest {
            usernames: vec!["alice".into()],
            message: "hello".into(),
            delay_range: [30, 60],
        };

        let err = client.send_messages(&request).await.expect_err("malformed");

        assert!(matches!(err, ApiError::Malformed(_)));
        let calls = stub.state.calls.lock().await;
        assert_eq!(
            calls[0].2,
            json!({"usernames": ["alice"], "message": "hello", "delay_range": [30, 60]})
        );
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let client = HttpApiClient::new(&format!("http://{addr}")).expect("client");

        let err = client.status().await.expect_err("unreachable");

        assert!(matches!(err, ApiError::Transport(_)));
    }
}
