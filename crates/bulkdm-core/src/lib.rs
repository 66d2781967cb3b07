pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod presenter;
pub mod state;
pub mod worker;

// Re-export main types for convenience
pub use api::{DashboardApi, HttpApiClient};
pub use config::Config;
pub use controller::Controller;
pub use error::{ApiError, DispatchError, ValidationError};
pub use form::{DelayRange, DraftForm, PendingSend, SendRequest};
pub use presenter::Presenter;
pub use state::{Operation, ProgressState, SendResult, SessionState, Severity, UserOutcome};
pub use worker::{spawn_worker, Command, DashboardHandle, UiEvent};
