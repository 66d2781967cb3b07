//! UI-agnostic dashboard state types
//!
//! These values are owned by the [`Controller`](crate::Controller) and handed
//! to a [`Presenter`](crate::Presenter) for drawing. None of them depend on a
//! specific UI framework.

use serde::{Deserialize, Serialize};

/// Login state as last reported by the backend or set by login/logout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub logged_in: bool,
    pub username: Option<String>,
}

impl SessionState {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn logged_in(username: impl Into<String>) -> Self {
        Self {
            logged_in: true,
            username: Some(username.into()),
        }
    }
}

/// Progress counter for a bulk send.
///
/// The backend only returns a final tally, so this jumps from the reset
/// value straight to the final value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub current: u64,
    pub total: u64,
    pub running: bool,
}

impl ProgressState {
    pub fn started() -> Self {
        Self {
            current: 0,
            total: 0,
            running: true,
        }
    }

    pub fn percent(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        ((self.current as f64 / self.total as f64) * 100.0).round() as u16
    }
}

/// Outcome of one recipient in a bulk send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOutcome {
    pub username: String,
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl UserOutcome {
    /// Status text shown next to the username
    pub fn status_text(&self) -> &str {
        if self.success {
            "Success"
        } else {
            self.error.as_deref().unwrap_or("Failed")
        }
    }
}

/// Aggregate result of a bulk send, in backend order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    pub successful: u64,
    pub failed: u64,
    pub results: Vec<UserOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Operation categories, used for busy tracking and the in-flight guard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Status,
    Login,
    Logout,
    UploadUsernames,
    SendMessages,
}

impl Operation {
    pub fn display_name(&self) -> &'static str {
        match self {
            Operation::Status => "Status check",
            Operation::Login => "Login",
            Operation::Logout => "Logout",
            Operation::UploadUsernames => "Loading usernames",
            Operation::SendMessages => "Sending messages",
        }
    }
}
