use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use bulkdm_core::Command;
use crate::app::{App, Field, InputMode, Screen};
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // The busy overlay blocks the screen like a modal
    if app.busy.is_some() {
        return;
    }

    if app.pending_send.is_some() {
        handle_confirmation(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => match app.screen() {
            Screen::Login => handle_login_normal(app, key),
            Screen::Dashboard => handle_dashboard_normal(app, key),
        },
        InputMode::Editing => handle_editing(app, key),
    }
}

fn handle_confirmation(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_send(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_send(),
        _ => {}
    }
}

fn handle_login_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab | KeyCode::Down | KeyCode::Char('j') => app.focus_next(),
        KeyCode::BackTab | KeyCode::Up | KeyCode::Char('k') => app.focus_prev(),
        KeyCode::Enter | KeyCode::Char('i') => app.input_mode = InputMode::Editing,
        KeyCode::Char('r') => app.submit(Command::CheckStatus),
        _ => {}
    }
}

fn handle_dashboard_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Field focus
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Enter | KeyCode::Char('i') => app.input_mode = InputMode::Editing,

        // Actions
        KeyCode::Char('l') => app.submit_load_usernames(),
        KeyCode::Char('s') => app.request_send(),
        KeyCode::Char('o') => app.submit(Command::Logout),

        // Results list
        KeyCode::Char('j') | KeyCode::Down => app.results_nav_down(),
        KeyCode::Char('k') | KeyCode::Up => app.results_nav_up(),

        _ => {}
    }
}

fn handle_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Enter => match app.focus {
            Field::LoginUsername => app.focus = Field::LoginPassword,
            Field::LoginPassword => app.submit_login(),
            field if field.is_multiline() => app.focused_text_mut().push('\n'),
            _ => app.input_mode = InputMode::Normal,
        },
        KeyCode::Backspace => {
            app.focused_text_mut().pop();
        }
        KeyCode::Char(c) => app.focused_text_mut().push(c),
        _ => {}
    }
}
