use std::time::{Duration, Instant};

use ratatui::widgets::ListState;
use bulkdm_core::{
    Command, DashboardHandle, DraftForm, PendingSend, ProgressState, SendResult, SessionState,
    Severity, UiEvent,
};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LoginUsername,
    LoginPassword,
    Usernames,
    Message,
    DelayMin,
    DelayMax,
}

impl Field {
    const LOGIN: [Field; 2] = [Field::LoginUsername, Field::LoginPassword];
    const DASHBOARD: [Field; 4] = [Field::Usernames, Field::Message, Field::DelayMin, Field::DelayMax];

    pub fn title(&self) -> &'static str {
        match self {
            Field::LoginUsername => "Username",
            Field::LoginPassword => "Password",
            Field::Usernames => "Usernames (one per line)",
            Field::Message => "Message",
            Field::DelayMin => "Min delay (s)",
            Field::DelayMax => "Max delay (s)",
        }
    }

    /// Enter inserts a newline instead of leaving the field
    pub fn is_multiline(&self) -> bool {
        matches!(self, Field::Usernames | Field::Message)
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    pub created: Instant,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: Field,

    // Inputs
    pub draft: DraftForm,
    pub pending_send: Option<PendingSend>,

    // Mirrors of controller state, fed by UiEvents
    pub session: SessionState,
    pub progress: ProgressState,
    pub results: Option<SendResult>,
    pub results_state: ListState,
    pub loaded: Option<u64>,
    pub busy: Option<String>,
    pub toasts: Vec<Toast>,

    // Animation state
    pub animation_frame: u8,

    pub api_base_url: String,
    handle: DashboardHandle,
}

impl App {
    pub fn new(handle: DashboardHandle, api_base_url: String) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: Field::LoginUsername,

            draft: DraftForm::default(),
            pending_send: None,

            session: SessionState::logged_out(),
            progress: ProgressState::default(),
            results: None,
            results_state: ListState::default(),
            loaded: None,
            busy: None,
            toasts: Vec::new(),

            animation_frame: 0,

            api_base_url,
            handle,
        }
    }

    pub fn screen(&self) -> Screen {
        if self.session.logged_in {
            Screen::Dashboard
        } else {
            Screen::Login
        }
    }

    /// Recomputed on every call, never cached
    pub fn can_send(&self) -> bool {
        self.draft.can_send(self.session.logged_in)
    }

    pub fn submit(&mut self, command: Command) {
        if let Err(err) = self.handle.submit(command) {
            self.toast(err.to_string(), Severity::Error);
        }
    }

    #[cfg(test)]
    pub fn is_running(&self, operation: bulkdm_core::Operation) -> bool {
        self.handle.is_running(operation)
    }

    pub fn toast(&mut self, message: impl Into<String>, severity: Severity) {
        self.toasts.push(Toast {
            message: message.into(),
            severity,
            created: Instant::now(),
        });
    }

    /// Apply one presenter call coming back from the worker
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::Session(session) => {
                let screen_changed = session.logged_in != self.session.logged_in;
                self.session = session;
                if screen_changed {
                    self.input_mode = InputMode::Normal;
                    self.focus = self.fields()[0];
                    self.draft.login_password.clear();
                }
            }
            UiEvent::Progress(progress) => self.progress = progress,
            UiEvent::Results(results) => {
                self.results_state
                    .select(results.as_ref().filter(|r| !r.results.is_empty()).map(|_| 0));
                self.results = results;
            }
            UiEvent::Loaded(count) => self.loaded = count,
            UiEvent::Notify { message, severity } => self.toast(message, severity),
            UiEvent::ShowBusy(label) => self.busy = Some(label),
            UiEvent::HideBusy => self.busy = None,
            UiEvent::ResetDashboard => {
                self.draft.reset_dashboard();
                self.pending_send = None;
            }
            UiEvent::Completed(operation) => self.handle.complete(operation),
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self.screen() {
            Screen::Login => &Field::LOGIN,
            Screen::Dashboard => &Field::DASHBOARD,
        }
    }

    pub fn focus_next(&mut self) {
        let fields = self.fields();
        let i = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(i + 1) % fields.len()];
    }

    pub fn focus_prev(&mut self) {
        let fields = self.fields();
        let i = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = fields[(i + fields.len() - 1) % fields.len()];
    }

    pub fn field_text(&self, field: Field) -> &str {
        match field {
            Field::LoginUsername => &self.draft.login_username,
            Field::LoginPassword => &self.draft.login_password,
            Field::Usernames => &self.draft.usernames_text,
            Field::Message => &self.draft.message,
            Field::DelayMin => &self.draft.delay_min,
            Field::DelayMax => &self.draft.delay_max,
        }
    }

    pub fn focused_text_mut(&mut self) -> &mut String {
        match self.focus {
            Field::LoginUsername => &mut self.draft.login_username,
            Field::LoginPassword => &mut self.draft.login_password,
            Field::Usernames => &mut self.draft.usernames_text,
            Field::Message => &mut self.draft.message,
            Field::DelayMin => &mut self.draft.delay_min,
            Field::DelayMax => &mut self.draft.delay_max,
        }
    }

    pub fn submit_login(&mut self) {
        let command = Command::Login {
            username: self.draft.login_username.clone(),
            password: self.draft.login_password.clone(),
        };
        self.input_mode = InputMode::Normal;
        self.submit(command);
    }

    pub fn submit_load_usernames(&mut self) {
        let raw = self.draft.usernames_text.clone();
        self.submit(Command::LoadUsernames { raw });
    }

    /// Validate the draft and open the yes/no confirmation. A disabled send
    /// does nothing.
    pub fn request_send(&mut self) {
        if !self.can_send() {
            return;
        }
        match self.draft.prepare_send() {
            Ok(pending) => self.pending_send = Some(pending),
            Err(err) => self.toast(err.to_string(), Severity::Error),
        }
    }

    pub fn confirm_send(&mut self) {
        if let Some(pending) = self.pending_send.take() {
            self.submit(Command::Send(pending.request));
        }
    }

    pub fn cancel_send(&mut self) {
        self.pending_send = None;
    }

    pub fn results_nav_down(&mut self) {
        let len = self.results.as_ref().map(|r| r.results.len()).unwrap_or(0);
        if len > 0 {
            let i = self.results_state.selected().unwrap_or(0);
            self.results_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn results_nav_up(&mut self) {
        let i = self.results_state.selected().unwrap_or(0);
        self.results_state.select(Some(i.saturating_sub(1)));
    }

    /// Tick: expire toasts and advance the busy spinner
    pub fn tick(&mut self) {
        self.expire_toasts(Instant::now());
        if self.busy.is_some() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        }
    }

    fn expire_toasts(&mut self, now: Instant) {
        self.toasts
            .retain(|toast| now.duration_since(toast.created) < TOAST_LIFETIME);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use bulkdm_core::{spawn_worker, Controller, HttpApiClient, Operation, UserOutcome};

    pub fn test_app() -> App {
        let client = HttpApiClient::new("http://127.0.0.1:9").expect("client");
        let (handle, _rx) = spawn_worker(Controller::new(client));
        App::new(handle, "http://127.0.0.1:9".into())
    }

    #[tokio::test]
    async fn session_event_switches_screen_and_focus() {
        let mut app = test_app();
        app.draft.login_password = "secret".into();
        assert_eq!(app.screen(), Screen::Login);

        app.apply(UiEvent::Session(SessionState::logged_in("brand")));

        assert_eq!(app.screen(), Screen::Dashboard);
        assert_eq!(app.focus, Field::Usernames);
        assert!(app.draft.login_password.is_empty());
    }

    #[tokio::test]
    async fn send_stays_disabled_until_all_three_hold() {
        let mut app = test_app();
        app.draft.usernames_text = "alice".into();
        app.draft.message = "hi".into();
        assert!(!app.can_send());

        app.request_send();
        assert!(app.pending_send.is_none());

        app.apply(UiEvent::Session(SessionState::logged_in("brand")));
        assert!(app.can_send());

        app.request_send();
        let pending = app.pending_send.as_ref().expect("confirmation open");
        assert!(pending.prompt.contains("1 users"));
    }

    #[tokio::test]
    async fn cancelled_confirmation_sends_nothing() {
        let mut app = test_app();
        app.apply(UiEvent::Session(SessionState::logged_in("brand")));
        app.draft.usernames_text = "alice".into();
        app.draft.message = "hi".into();

        app.request_send();
        app.cancel_send();

        assert!(app.pending_send.is_none());
        assert!(!app.handle.is_running(Operation::SendMessages));
    }

    #[tokio::test]
    async fn confirmed_send_is_guarded_until_completed() {
        let mut app = test_app();
        app.apply(UiEvent::Session(SessionState::logged_in("brand")));
        app.draft.usernames_text = "alice".into();
        app.draft.message = "hi".into();

        app.request_send();
        app.confirm_send();
        assert!(app.handle.is_running(Operation::SendMessages));

        app.request_send();
        app.confirm_send();
        assert_eq!(
            app.toasts.last().map(|t| t.message.as_str()),
            Some("Sending messages is already in progress")
        );

        app.apply(UiEvent::Completed(Operation::SendMessages));
        assert!(!app.handle.is_running(Operation::SendMessages));
    }

    #[tokio::test]
    async fn reset_dashboard_clears_inputs() {
        let mut app = test_app();
        app.draft.usernames_text = "alice".into();
        app.draft.message = "hi".into();
        app.draft.delay_min = "10".into();

        app.apply(UiEvent::ResetDashboard);

        assert!(app.draft.usernames_text.is_empty());
        assert!(app.draft.message.is_empty());
        assert_eq!(app.draft.delay_min, "10");
    }

    #[tokio::test]
    async fn results_event_selects_first_row() {
        let mut app = test_app();
        let result = SendResult {
            successful: 1,
            failed: 0,
            results: vec![UserOutcome {
                username: "alice".into(),
                success: true,
                error: None,
            }],
        };

        app.apply(UiEvent::Results(Some(result)));
        assert_eq!(app.results_state.selected(), Some(0));

        app.apply(UiEvent::Results(None));
        assert_eq!(app.results_state.selected(), None);
        assert!(app.results.is_none());
    }

    #[tokio::test]
    async fn busy_overlay_follows_events() {
        let mut app = test_app();
        app.apply(UiEvent::ShowBusy("Sending messages...".into()));
        assert_eq!(app.busy.as_deref(), Some("Sending messages..."));
        app.apply(UiEvent::HideBusy);
        assert!(app.busy.is_none());
    }

    #[tokio::test]
    async fn toasts_expire_after_five_seconds() {
        let mut app = test_app();
        app.toast("old", Severity::Info);
        app.toast("fresh", Severity::Success);
        let start = app.toasts[0].created;
        app.toasts[1].created = start + TOAST_LIFETIME;

        app.expire_toasts(start + TOAST_LIFETIME + Duration::from_secs(1));

        let remaining: Vec<&str> = app.toasts.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(remaining, vec!["fresh"]);
    }
}
