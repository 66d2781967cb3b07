use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Wrap},
};
use bulkdm_core::Severity;
use crate::app::{App, Field, InputMode, Screen};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen() {
        Screen::Login => render_login_screen(app, frame, body_area),
        Screen::Dashboard => render_dashboard_screen(app, frame, body_area),
    }

    render_footer(app, frame, footer_area);

    // Overlays, lowest priority first
    render_toasts(app, frame, body_area);
    if let Some(pending) = &app.pending_send {
        render_confirmation(&pending.prompt, frame, area);
    }
    if let Some(label) = &app.busy {
        render_busy(label, app.animation_frame, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (dot_color, status_text) = if app.session.logged_in {
        (Color::Green, "Online")
    } else {
        (Color::Red, "Offline")
    };

    let mut spans = vec![
        Span::styled(" bulkdm ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
        Span::styled("● ", Style::default().fg(dot_color)),
        Span::raw(status_text),
    ];
    if let Some(username) = &app.session.username {
        spans.push(Span::styled(
            format!("  @{}", username),
            Style::default().fg(Color::Yellow).bold(),
        ));
    }
    spans.push(Span::styled(
        format!("  {}", app.api_base_url),
        Style::default().fg(Color::Gray),
    ));

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " EDIT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let keys: &[(&str, &str)] = if app.pending_send.is_some() {
        &[(" y ", " send "), (" n ", " cancel ")]
    } else {
        match (app.screen(), app.input_mode) {
            (Screen::Login, InputMode::Normal) => &[
                (" Tab ", " field "),
                (" Enter ", " edit "),
                (" r ", " status "),
                (" q ", " quit "),
            ],
            (Screen::Login, InputMode::Editing) => &[
                (" Enter ", " next/login "),
                (" Tab ", " field "),
                (" Esc ", " stop typing "),
            ],
            (Screen::Dashboard, InputMode::Normal) => &[
                (" Tab ", " field "),
                (" Enter ", " edit "),
                (" l ", " load usernames "),
                (" s ", " send "),
                (" j/k ", " results "),
                (" o ", " logout "),
                (" q ", " quit "),
            ],
            (Screen::Dashboard, InputMode::Editing) => &[
                (" Tab ", " field "),
                (" Esc ", " stop typing "),
            ],
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(keys.iter().flat_map(|(key, label)| {
            [Span::styled(*key, key_style), Span::styled(*label, label_style)]
        }))
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn field_block(app: &App, field: Field, title: String) -> Block<'static> {
    let focused = app.focus == field;
    let border_color = match (focused, app.input_mode) {
        (true, InputMode::Editing) => Color::Yellow,
        (true, InputMode::Normal) => Color::Cyan,
        (false, _) => Color::DarkGray,
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", title))
}

fn render_input(app: &App, frame: &mut Frame, area: Rect, field: Field, title: String) {
    let text = app.field_text(field);
    let shown = if field == Field::LoginPassword {
        "*".repeat(text.chars().count())
    } else {
        text.to_string()
    };
    let mut content = Text::from(shown);
    if app.focus == field && app.input_mode == InputMode::Editing {
        // Cursor marker at the end of the text
        let cursor = Span::styled("_", Style::default().fg(Color::Yellow));
        if text.ends_with('\n') || content.lines.is_empty() {
            content.lines.push(Line::from(cursor));
        } else if let Some(line) = content.lines.last_mut() {
            line.spans.push(cursor);
        }
    }

    let paragraph = Paragraph::new(content)
        .block(field_block(app, field, title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_login_screen(app: &App, frame: &mut Frame, area: Rect) {
    let [form_area] = Layout::horizontal([Constraint::Length(50)])
        .flex(Flex::Center)
        .areas(area);
    let [title_area, username_area, password_area, hint_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(2),
    ])
    .flex(Flex::Center)
    .areas(form_area);

    frame.render_widget(
        Paragraph::new(Line::from("Log in to the automation account").bold()).centered(),
        title_area,
    );
    render_input(app, frame, username_area, Field::LoginUsername, Field::LoginUsername.title().to_string());
    render_input(app, frame, password_area, Field::LoginPassword, Field::LoginPassword.title().to_string());
    frame.render_widget(
        Paragraph::new(Line::from("Enter on the password field logs in").fg(Color::Gray)).centered(),
        hint_area,
    );
}

fn render_dashboard_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let show_progress = app.progress.running;
    let show_results = app.results.is_some();

    let [top_area, progress_area, results_area] = Layout::vertical([
        Constraint::Min(10),
        Constraint::Length(if show_progress { 3 } else { 0 }),
        Constraint::Length(if show_results { 12 } else { 0 }),
    ])
    .areas(area);

    let [usernames_col, message_col] = Layout::horizontal([
        Constraint::Percentage(40),
        Constraint::Percentage(60),
    ])
    .areas(top_area);

    render_usernames_column(app, frame, usernames_col);
    render_message_column(app, frame, message_col);

    if show_progress {
        render_progress(app, frame, progress_area);
    }
    if show_results {
        render_results(app, frame, results_area);
    }
}

fn render_usernames_column(app: &App, frame: &mut Frame, area: Rect) {
    let [editor_area, loaded_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    let entries = app.draft.usernames().len();
    render_input(
        app,
        frame,
        editor_area,
        Field::Usernames,
        format!("{} [{}]", Field::Usernames.title(), entries),
    );

    let loaded = match app.loaded {
        Some(count) => Line::from(vec![
            Span::raw(" Loaded on backend: "),
            Span::styled(count.to_string(), Style::default().fg(Color::Green).bold()),
        ]),
        None => Line::from(" Nothing loaded yet (press l)").fg(Color::Gray),
    };
    frame.render_widget(Paragraph::new(loaded), loaded_area);
}

fn render_message_column(app: &App, frame: &mut Frame, area: Rect) {
    let [message_area, delay_area, send_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_input(
        app,
        frame,
        message_area,
        Field::Message,
        format!("{} ({} chars)", Field::Message.title(), app.draft.message_chars()),
    );

    let [min_area, max_area] = Layout::horizontal([
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .areas(delay_area);
    let delays = app.draft.delay_range();
    render_input(app, frame, min_area, Field::DelayMin, format!("{} = {}", Field::DelayMin.title(), delays.min));
    render_input(app, frame, max_area, Field::DelayMax, format!("{} = {}", Field::DelayMax.title(), delays.max));

    let send_line = if app.can_send() {
        Line::from(vec![
            Span::styled(" s ", Style::default().bg(Color::Green).fg(Color::Black)),
            Span::styled(" Send messages ", Style::default().fg(Color::Green).bold()),
        ])
    } else {
        Line::from(vec![
            Span::styled(" s ", Style::default().bg(Color::DarkGray).fg(Color::Gray)),
            Span::styled(
                " Send messages (needs usernames and a message) ",
                Style::default().fg(Color::DarkGray),
            ),
        ])
    };
    frame.render_widget(Paragraph::new(send_line), send_area);
}

fn render_progress(app: &App, frame: &mut Frame, area: Rect) {
    let progress = &app.progress;
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Progress "),
        )
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(progress.percent().min(100))
        .label(format!(
            "{} / {}  {}%",
            progress.current,
            progress.total,
            progress.percent()
        ));
    frame.render_widget(gauge, area);
}

fn render_results(app: &mut App, frame: &mut Frame, area: Rect) {
    let Some(result) = &app.results else {
        return;
    };

    let title = Line::from(vec![
        Span::raw(" Results  "),
        Span::styled(format!("✔ {}", result.successful), Style::default().fg(Color::Green).bold()),
        Span::raw("  "),
        Span::styled(format!("✘ {}", result.failed), Style::default().fg(Color::Red).bold()),
        Span::raw(" "),
    ]);

    let items: Vec<ListItem> = result
        .results
        .iter()
        .map(|outcome| {
            let (icon, color) = if outcome.success {
                ("✔", Color::Green)
            } else {
                ("✘", Color::Red)
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!(" @{:<24} ", outcome.username)),
                Span::styled(format!("{} {}", icon, outcome.status_text()), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(title),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut app.results_state);
}

fn render_toasts(app: &App, frame: &mut Frame, area: Rect) {
    let width = 48.min(area.width);
    let mut y = area.y;

    for toast in app.toasts.iter().rev() {
        let color = match toast.severity {
            Severity::Info => Color::Blue,
            Severity::Success => Color::Green,
            Severity::Warning => Color::Yellow,
            Severity::Error => Color::Red,
        };
        let inner_width = width.saturating_sub(2).max(1) as usize;
        let lines = (toast.message.chars().count() / inner_width + 1) as u16;
        let height = lines + 2;
        if y + height > area.y + area.height {
            break;
        }

        let toast_area = Rect {
            x: area.x + area.width - width,
            y,
            width,
            height,
        };
        let paragraph = Paragraph::new(toast.message.as_str())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(format!(" {} ", toast.severity.as_str())),
            );
        frame.render_widget(Clear, toast_area);
        frame.render_widget(paragraph, toast_area);
        y += height;
    }
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let [horizontal] = Layout::horizontal([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::vertical([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(horizontal);
    rect
}

fn render_confirmation(prompt: &str, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 60, 10);
    let mut lines: Vec<Line> = prompt.lines().map(|l| Line::from(l.to_string())).collect();
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled(" y ", Style::default().bg(Color::Green).fg(Color::Black)),
        Span::raw(" send   "),
        Span::styled(" n ", Style::default().bg(Color::Red).fg(Color::White)),
        Span::raw(" cancel"),
    ]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Confirm bulk send "),
    );
    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}

fn render_busy(label: &str, frame_idx: u8, frame: &mut Frame, area: Rect) {
    let popup = centered_rect(area, 36, 3);
    let spinner = SPINNER[frame_idx as usize % SPINNER.len()];
    let paragraph = Paragraph::new(Line::from(format!("{} {}", spinner, label)).bold())
        .centered()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}
