//! Background task that owns the controller
//!
//! The UI loop never awaits the backend. It submits [`Command`]s through a
//! [`DashboardHandle`] and drains [`UiEvent`]s that the worker's
//! [`ChannelPresenter`] emits.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::api::DashboardApi;
use crate::controller::Controller;
use crate::error::DispatchError;
use crate::form::SendRequest;
use crate::presenter::Presenter;
use crate::state::{Operation, ProgressState, SendResult, SessionState, Severity};

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CheckStatus,
    Login { username: String, password: String },
    Logout,
    LoadUsernames { raw: String },
    Send(SendRequest),
}

impl Command {
    pub fn operation(&self) -> Operation {
        match self {
            Command::CheckStatus => Operation::Status,
            Command::Login { .. } => Operation::Login,
            Command::Logout => Operation::Logout,
            Command::LoadUsernames { .. } => Operation::UploadUsernames,
            Command::Send(_) => Operation::SendMessages,
        }
    }
}

/// One presenter call, shipped to the UI thread
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Session(SessionState),
    Progress(ProgressState),
    Results(Option<SendResult>),
    Loaded(Option<u64>),
    Notify { message: String, severity: Severity },
    ShowBusy(String),
    HideBusy,
    ResetDashboard,
    /// Emitted after every command, whatever its outcome
    Completed(Operation),
}

pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl ChannelPresenter {
    pub fn new(tx: mpsc::UnboundedSender<UiEvent>) -> Self {
        Self { tx }
    }

    fn emit(&self, event: UiEvent) {
        // The UI may already be gone during shutdown
        let _ = self.tx.send(event);
    }

    fn completed(&self, operation: Operation) {
        self.emit(UiEvent::Completed(operation));
    }
}

impl Presenter for ChannelPresenter {
    fn render_session(&mut self, session: &SessionState) {
        self.emit(UiEvent::Session(session.clone()));
    }

    fn render_progress(&mut self, progress: &ProgressState) {
        self.emit(UiEvent::Progress(*progress));
    }

    fn render_results(&mut self, results: Option<&SendResult>) {
        self.emit(UiEvent::Results(results.cloned()));
    }

    fn render_loaded(&mut self, count: Option<u64>) {
        self.emit(UiEvent::Loaded(count));
    }

    fn notify(&mut self, message: &str, severity: Severity) {
        self.emit(UiEvent::Notify {
            message: message.to_string(),
            severity,
        });
    }

    fn show_busy(&mut self, label: &str) {
        self.emit(UiEvent::ShowBusy(label.to_string()));
    }

    fn hide_busy(&mut self) {
        self.emit(UiEvent::HideBusy);
    }

    fn reset_dashboard(&mut self) {
        self.emit(UiEvent::ResetDashboard);
    }
}

/// Operation categories submitted but not yet completed
#[derive(Debug, Default)]
pub struct InFlight {
    pending: HashSet<Operation>,
}

impl InFlight {
    pub fn begin(&mut self, operation: Operation) -> Result<(), DispatchError> {
        if !self.pending.insert(operation) {
            return Err(DispatchError::Busy(operation));
        }
        Ok(())
    }

    pub fn finish(&mut self, operation: Operation) {
        self.pending.remove(&operation);
    }

    pub fn contains(&self, operation: Operation) -> bool {
        self.pending.contains(&operation)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// UI-side end of the worker
pub struct DashboardHandle {
    commands: mpsc::UnboundedSender<Command>,
    in_flight: InFlight,
}

impl DashboardHandle {
    /// Queue a command unless one of the same category is still running.
    pub fn submit(&mut self, command: Command) -> Result<(), DispatchError> {
        let operation = command.operation();
        self.in_flight.begin(operation)?;
        if self.commands.send(command).is_err() {
            self.in_flight.finish(operation);
            return Err(DispatchError::Disconnected);
        }
        Ok(())
    }

    /// Call when the matching [`UiEvent::Completed`] arrives.
    pub fn complete(&mut self, operation: Operation) {
        self.in_flight.finish(operation);
    }

    pub fn is_running(&self, operation: Operation) -> bool {
        self.in_flight.contains(operation)
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }
}

/// Move the controller onto a tokio task.
///
/// Commands run one at a time in submission order. A panic inside a command
/// is caught, reported as a generic notification, and the worker keeps going.
pub fn spawn_worker<A>(controller: Controller<A>) -> (DashboardHandle, mpsc::UnboundedReceiver<UiEvent>)
where
    A: DashboardApi + 'static,
{
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();
    let (ui_tx, ui_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut controller = controller;
        let mut presenter = ChannelPresenter::new(ui_tx);

        while let Some(command) = command_rx.recv().await {
            let operation = command.operation();
            debug!(?operation, "running command");

            let outcome = AssertUnwindSafe(run_command(&mut controller, &mut presenter, command))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                error!(?operation, "command panicked");
                presenter.hide_busy();
                presenter.notify(UNEXPECTED_ERROR, Severity::Error);
            }

            presenter.completed(operation);
        }
        debug!("command channel closed, worker exiting");
    });

    let handle = DashboardHandle {
        commands: command_tx,
        in_flight: InFlight::default(),
    };
    (handle, ui_rx)
}

async fn run_command<A: DashboardApi>(
    controller: &mut Controller<A>,
    presenter: &mut ChannelPresenter,
    command: Command,
) {
    // Failures were already shown to the user by the controller
    let outcome = match command {
        Command::CheckStatus => {
            controller.check_status(presenter).await;
            Ok(())
        }
        Command::Login { username, password } => controller
            .login(presenter, &username, &password)
            .await
            .map(|_| ()),
        Command::Logout => {
            controller.logout(presenter).await;
            Ok(())
        }
        Command::LoadUsernames { raw } => controller.load_usernames(presenter, &raw).await.map(|_| ()),
        Command::Send(request) => controller.send(presenter, request).await.map(|_| ()),
    };
    if let Err(err) = outcome {
        debug!(error = %err, "command finished with an error");
    }
}
