//! Session & dispatch controller
//!
//! Owns the session, progress and result state and turns each backend reply
//! into presenter calls. Every operation reports its outcome exactly once and
//! nothing is retried.

use tracing::{debug, info, warn};

use crate::api::{DashboardApi, LoginRequest, SendMessagesRequest, UploadUsernamesRequest};
use crate::error::{ApiError, DispatchError, ValidationError};
use crate::form::SendRequest;
use crate::presenter::Presenter;
use crate::state::{ProgressState, SendResult, SessionState, Severity};

const OFFLINE_MESSAGE: &str =
    "Cannot connect to backend server. Please check if the server is running.";

pub struct Controller<A> {
    api: A,
    session: SessionState,
    progress: ProgressState,
    results: Option<SendResult>,
    loaded: Option<u64>,
}

impl<A: DashboardApi> Controller<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            session: SessionState::logged_out(),
            progress: ProgressState::default(),
            results: None,
            loaded: None,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn results(&self) -> Option<&SendResult> {
        self.results.as_ref()
    }

    pub fn loaded(&self) -> Option<u64> {
        self.loaded
    }

    #[cfg(test)]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Startup query. An unreachable backend counts as logged out.
    ///
    /// Once logged in, only logout leaves the session, so a later check is a
    /// no-op that re-renders the current session.
    pub async fn check_status<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> SessionState {
        if self.session.logged_in {
            debug!("status check skipped, session already active");
            presenter.render_session(&self.session);
            return self.session.clone();
        }

        match self.api.status().await {
            Ok(status) if status.is_logged_in => {
                info!(username = ?status.username, "backend reports an active session");
                self.session = SessionState {
                    logged_in: true,
                    username: status.username,
                };
            }
            Ok(_) => {
                self.session = SessionState::logged_out();
            }
            Err(err) => {
                warn!(error = %err, "status check failed");
                self.session = SessionState::logged_out();
                presenter.notify(OFFLINE_MESSAGE, Severity::Error);
            }
        }
        presenter.render_session(&self.session);
        self.session.clone()
    }

    pub async fn login<P: Presenter + ?Sized>(
        &mut self,
        presenter: &mut P,
        username: &str,
        password: &str,
    ) -> Result<SessionState, DispatchError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(report_validation(presenter, ValidationError::MissingCredentials));
        }

        presenter.show_busy("Logging in...");
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let outcome = match self.api.login(&request).await {
            Ok(response) => response.into_result().map(|_| ()),
            Err(err) => Err(err),
        };
        presenter.hide_busy();

        match outcome {
            Ok(()) => {
                info!(%username, "logged in");
                self.session = SessionState::logged_in(username);
                presenter.render_session(&self.session);
                presenter.notify("Successfully logged in!", Severity::Success);
                Ok(self.session.clone())
            }
            Err(err) => {
                let fallback = if err.is_backend() {
                    "Login failed"
                } else {
                    "Login failed. Please try again."
                };
                Err(report_api(presenter, err, fallback))
            }
        }
    }

    /// Local-first: the session and every dependent view are reset whatever
    /// the backend answers.
    pub async fn logout<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> SessionState {
        presenter.show_busy("Logging out...");
        let outcome = self.api.logout().await;
        presenter.hide_busy();

        self.session = SessionState::logged_out();
        self.progress = ProgressState::default();
        self.results = None;
        self.loaded = None;

        presenter.render_session(&self.session);
        presenter.reset_dashboard();
        presenter.render_progress(&self.progress);
        presenter.render_results(None);
        presenter.render_loaded(None);

        match outcome {
            Ok(()) => {
                info!("logged out");
                presenter.notify("Successfully logged out!", Severity::Success);
            }
            Err(err) => {
                warn!(error = %err, "backend did not confirm logout");
                presenter.notify(
                    "Logged out locally; the backend did not confirm the logout",
                    Severity::Warning,
                );
            }
        }
        self.session.clone()
    }

    pub async fn load_usernames<P: Presenter + ?Sized>(
        &mut self,
        presenter: &mut P,
        raw_text: &str,
    ) -> Result<u64, DispatchError> {
        let usernames = raw_text.trim();
        if usernames.is_empty() {
            return Err(report_validation(presenter, ValidationError::NoUsernames));
        }

        presenter.show_busy("Loading usernames...");
        let request = UploadUsernamesRequest {
            usernames: usernames.to_string(),
        };
        let outcome = match self.api.upload_usernames(&request).await {
            Ok(response) => response.into_data(),
            Err(err) => Err(err),
        };
        presenter.hide_busy();

        match outcome {
            Ok(data) => {
                info!(count = data.count, "usernames loaded");
                self.loaded = Some(data.count);
                presenter.render_loaded(self.loaded);
                presenter.notify(
                    &format!("Successfully loaded {} usernames", data.count),
                    Severity::Success,
                );
                Ok(data.count)
            }
            Err(err) => Err(report_api(presenter, err, "Failed to load usernames")),
        }
    }

    /// Issue a confirmed bulk send and render the final tally.
    ///
    /// Busy and progress indicators are cleared on every path that reaches
    /// the backend.
    pub async fn send<P: Presenter + ?Sized>(
        &mut self,
        presenter: &mut P,
        request: SendRequest,
    ) -> Result<SendResult, DispatchError> {
        if !self.session.logged_in {
            return Err(report_validation(presenter, ValidationError::NotLoggedIn));
        }
        if let Err(err) = request.validate() {
            return Err(report_validation(presenter, err));
        }

        presenter.show_busy("Sending messages...");
        self.results = None;
        presenter.render_results(None);
        self.progress = ProgressState::started();
        presenter.render_progress(&self.progress);

        info!(
            recipients = request.usernames.len(),
            delay_min = request.delay_range.min,
            delay_max = request.delay_range.max,
            "dispatching bulk send"
        );
        let wire = SendMessagesRequest {
            usernames: request.usernames,
            message: request.message,
            delay_range: request.delay_range.as_pair(),
        };
        let outcome = match self.api.send_messages(&wire).await {
            Ok(response) => response.into_data().map(SendResult::from),
            Err(err) => Err(err),
        };

        let result = match outcome {
            Ok(result) => {
                let total = result.results.len() as u64;
                self.progress = ProgressState {
                    current: total,
                    total,
                    running: true,
                };
                presenter.render_progress(&self.progress);
                presenter.notify(
                    &format!(
                        "Messages sent! Success: {}, Failed: {}",
                        result.successful, result.failed
                    ),
                    Severity::Success,
                );
                presenter.render_results(Some(&result));
                self.results = Some(result.clone());
                Ok(result)
            }
            Err(err) => Err(report_api(presenter, err, "Failed to send messages")),
        };

        presenter.hide_busy();
        self.progress.running = false;
        presenter.render_progress(&self.progress);
        result
    }
}

fn report_validation<P: Presenter + ?Sized>(presenter: &mut P, err: ValidationError) -> DispatchError {
    presenter.notify(&err.to_string(), Severity::Error);
    err.into()
}

fn report_api<P: Presenter + ?Sized>(presenter: &mut P, err: ApiError, fallback: &str) -> DispatchError {
    warn!(error = %err, "{fallback}");
    presenter.notify(&err.user_message(fallback), Severity::Error);
    err.into()
}
