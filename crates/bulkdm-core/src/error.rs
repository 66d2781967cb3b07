use thiserror::Error;

use crate::state::Operation;

/// Input problems caught before any request is issued.
///
/// The display text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter both username and password")]
    MissingCredentials,
    #[error("Please enter some usernames")]
    NoUsernames,
    #[error("Please enter a message")]
    EmptyMessage,
    #[error("Please log in first")]
    NotLoggedIn,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("backend reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Backend(Option<String>),
}

impl ApiError {
    /// Message for the user: the backend's own text when it sent one,
    /// otherwise the per-operation fallback.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Backend(Some(message)) if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_backend(&self) -> bool {
        matches!(self, ApiError::Backend(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("{} is already in progress", .0.display_name())]
    Busy(Operation),
    #[error("The dashboard worker has stopped")]
    Disconnected,
}
