pub mod http;

pub use http::HttpApiClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::{SendResult, UserOutcome};

pub const STATUS_PATH: &str = "/api/status";
pub const LOGIN_PATH: &str = "/api/login";
pub const LOGOUT_PATH: &str = "/api/logout";
pub const UPLOAD_USERNAMES_PATH: &str = "/api/upload-usernames";
pub const SEND_MESSAGES_PATH: &str = "/api/send-messages";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub is_logged_in: bool,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadUsernamesRequest {
    /// Raw newline-delimited text; the backend does the splitting
    pub usernames: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagesRequest {
    pub usernames: Vec<String>,
    pub message: String,
    pub delay_range: [i64; 2],
}

/// In-band result envelope shared by login, upload and send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Turn `success: false` into [`ApiError::Backend`].
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ApiError::Backend(self.message))
        }
    }

    /// Like [`into_result`](Self::into_result) but a successful reply must
    /// carry `data`.
    pub fn into_data(self) -> Result<T, ApiError> {
        self.into_result()?
            .ok_or_else(|| ApiError::Malformed("successful response without data".to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadData {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendData {
    pub successful: u64,
    pub failed: u64,
    #[serde(default)]
    pub results: Vec<UserOutcome>,
}

impl From<SendData> for SendResult {
    fn from(data: SendData) -> Self {
        Self {
            successful: data.successful,
            failed: data.failed,
            results: data.results,
        }
    }
}

/// Transport to the automation backend.
///
/// Implementations decode the wire shapes but leave the `success` flag for
/// the controller to interpret.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn status(&self) -> Result<StatusResponse, ApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<serde_json::Value>, ApiError>;
    async fn logout(&self) -> Result<(), ApiError>;
    async fn upload_usernames(
        &self,
        request: &UploadUsernamesRequest,
    ) -> Result<ApiResponse<UploadData>, ApiError>;
    async fn send_messages(
        &self,
        request: &SendMessagesRequest,
    ) -> Result<ApiResponse<SendData>, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_serializes_delay_range_as_pair() {
        let request = SendMessagesRequest {
            usernames: vec!["alice".into(), "bob".into()],
            message: "hi".into(),
            delay_range: [30, 60],
        };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "usernames": ["alice", "bob"],
                "message": "hi",
                "delay_range": [30, 60]
            })
        );
    }

    #[test]
    fn failure_envelope_without_data_decodes() {
        let response: ApiResponse<UploadData> =
            serde_json::from_str(r#"{"success": false, "message": "Not logged in"}"#)
                .expect("decode");
        assert_eq!(
            response.into_data(),
            Err(ApiError::Backend(Some("Not logged in".into())))
        );
    }

    #[test]
    fn success_without_data_is_malformed() {
        let response: ApiResponse<UploadData> =
            serde_json::from_str(r#"{"success": true}"#).expect("decode");
        assert!(matches!(response.into_data(), Err(ApiError::Malformed(_))));
    }

    #[test]
    fn send_data_keeps_backend_order() {
        let response: ApiResponse<SendData> = serde_json::from_str(
            r#"{
                "success": true,
                "data": {
                    "successful": 1,
                    "failed": 1,
                    "results": [
                        {"username": "zed", "success": false, "error": "Blocked"},
                        {"username": "amy", "success": true}
                    ]
                }
            }"#,
        )
        .expect("decode");
        let result: SendResult = response.into_data().expect("data").into();
        let names: Vec<&str> = result.results.iter().map(|r| r.username.as_str()).collect();
        assert_eq!(names, vec!["zed", "amy"]);
        assert_eq!(result.results[0].error.as_deref(), Some("Blocked"));
        assert_eq!(result.results[1].error, None);
    }
}
