use crate::state::{ProgressState, SendResult, SessionState, Severity};

/// Everything the controller is allowed to ask of the screen.
///
/// The controller never draws anything itself; a TUI, a test recorder, or any
/// other front end implements this.
pub trait Presenter: Send {
    fn render_session(&mut self, session: &SessionState);
    fn render_progress(&mut self, progress: &ProgressState);
    /// `None` hides the results panel
    fn render_results(&mut self, results: Option<&SendResult>);
    fn render_loaded(&mut self, count: Option<u64>);
    fn notify(&mut self, message: &str, severity: Severity);
    fn show_busy(&mut self, label: &str);
    fn hide_busy(&mut self);
    /// Drop the dashboard inputs (usernames, message, delays)
    fn reset_dashboard(&mut self);
}
