//! Terminal UI rendering with ratatui
//!
//! Rendering is a pure projection of `App`: session context, status board,
//! forms and notice. No state lives in the widgets.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use medisecure_core::monitor::{Reachability, ServiceId};
use medisecure_core::session::View;

use crate::app::{App, AuthOp, AuthTab, LoginField, NoticeLevel, RegisterField};

/// Main draw function
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(1),    // Active view
            Constraint::Length(1), // Notice / key hints
        ])
        .split(f.area());

    draw_title_bar(f, app, chunks[0]);
    match app.session.view() {
        View::Auth => draw_auth_view(f, app, chunks[1]),
        View::Portal => draw_portal_view(f, app, chunks[1]),
    }
    draw_bottom_line(f, app, chunks[2]);
}

fn draw_title_bar(f: &mut Frame, app: &App, area: Rect) {
    let user = match app.session.current_user_id() {
        Some(user_id) => format!(" [{}]", user_id),
        None => String::new(),
    };

    let title_bar = Paragraph::new(Line::from(vec![
        Span::styled(
            " MediSecure Portal ",
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled(user, Style::default().fg(Color::Green)),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    f.render_widget(title_bar, area);
}

/// The unauthenticated view: login/register tabs plus the issued-card panel
fn draw_auth_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Length(9), // Form
            Constraint::Min(1),    // Issued card panel
        ])
        .split(area);

    draw_auth_tabs(f, app, chunks[0]);
    match app.auth_tab {
        AuthTab::Login => draw_login_form(f, app, chunks[1]),
        AuthTab::Register => draw_register_form(f, app, chunks[1]),
    }
    draw_issued_card(f, app, chunks[2]);
}

fn draw_auth_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab = |label: &'static str, active: bool| {
        if active {
            Span::styled(
                label,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(label, Style::default().fg(Color::DarkGray))
        }
    };

    let tabs = Paragraph::new(Line::from(vec![
        tab("  Sign In  ", app.auth_tab == AuthTab::Login),
        Span::raw("│"),
        tab("  Create Account  ", app.auth_tab == AuthTab::Register),
    ]));

    f.render_widget(tabs, area);
}

fn field_line<'a>(label: &'a str, value: &'a str, masked: bool, focused: bool) -> Line<'a> {
    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };

    Line::from(vec![
        Span::styled(format!("{:<18}", label), style),
        Span::styled(shown, style),
        Span::styled(if focused { "▏" } else { "" }, Style::default().fg(Color::Cyan)),
    ])
}

fn draw_login_form(f: &mut Frame, app: &App, area: Rect) {
    let form = &app.login_form;
    let mut lines = vec![
        field_line("User ID:", &form.user_id, false, form.focus == LoginField::UserId),
        field_line("Password:", &form.password, true, form.focus == LoginField::Password),
        Line::raw(""),
        submit_line(app, "Sign In"),
    ];
    if app.in_flight == Some(AuthOp::Login) {
        lines.push(processing_line());
    }

    let block = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Sign In "));
    f.render_widget(block, area);
}

fn draw_register_form(f: &mut Frame, app: &App, area: Rect) {
    let form = &app.register_form;
    let mut lines = vec![
        field_line("User ID:", &form.user_id, false, form.focus == RegisterField::UserId),
        field_line("Password:", &form.password, true, form.focus == RegisterField::Password),
        field_line("Confirm Password:", &form.confirm, true, form.focus == RegisterField::Confirm),
        Line::raw(""),
        submit_line(app, "Create Account"),
    ];
    if app.in_flight == Some(AuthOp::Register) {
        lines.push(processing_line());
    }

    let block =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Create Account "));
    f.render_widget(block, area);
}

fn submit_line(app: &App, label: &'static str) -> Line<'static> {
    if app.in_flight.is_some() {
        Line::from(Span::styled(
            format!("[ {} ] (processing...)", label),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            format!("[ Enter: {} ]", label),
            Style::default().fg(Color::Cyan),
        ))
    }
}

fn processing_line() -> Line<'static> {
    Line::from(Span::styled(
        "Processing...",
        Style::default().fg(Color::Yellow),
    ))
}

/// Smartcard material issued by the last successful registration
fn draw_issued_card(f: &mut Frame, app: &App, area: Rect) {
    let Some(card) = app.session.issued_card() else {
        return;
    };

    let secret = |label: &'static str, value: &str| {
        Line::from(vec![
            Span::styled(format!("{:<6}", label), Style::default().fg(Color::Gray)),
            Span::styled(truncate(value, 56), Style::default().fg(Color::White)),
        ])
    };

    let lines = vec![
        secret("UID:", &card.uid),
        secret("W_i:", &card.smartcard.w),
        secret("X_i:", &card.smartcard.x),
        secret("Y_i:", &card.smartcard.y),
        secret("Z_i:", &card.smartcard.z),
        secret("E_i:", &card.smartcard.e),
        Line::raw(""),
        Line::from(Span::styled(
            "Store these credentials safely, then sign in.",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let block = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Smartcard Credentials "));
    f.render_widget(block, area);
}

/// The authenticated view: session details and service health
fn draw_portal_view(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Session panel
            Constraint::Min(1),    // Service status
        ])
        .split(area);

    draw_session_panel(f, app, chunks[0]);
    draw_service_status(f, app, chunks[1]);
}

fn draw_session_panel(f: &mut Frame, app: &App, area: Rect) {
    let user_id = app.session.current_user_id().unwrap_or("-");
    let session_key = app.session.session_key().unwrap_or("-");

    let lines = vec![
        Line::from(vec![
            Span::styled("User:        ", Style::default().fg(Color::Gray)),
            Span::styled(user_id.to_string(), Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Session key: ", Style::default().fg(Color::Gray)),
            Span::styled(truncate(session_key, 56), Style::default().fg(Color::Green)),
        ]),
    ];

    let block = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Active Session "));
    f.render_widget(block, area);
}

fn draw_service_status(f: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();

    for service in ServiceId::ALL {
        let status = app.board.status(service);
        let (dot, text, color) = match status.reachable {
            Reachability::Online => ("●", "Online", Color::Green),
            Reachability::Offline => ("●", "Offline", Color::Red),
            Reachability::Unknown => ("○", "Checking...", Color::DarkGray),
        };

        lines.push(Line::from(vec![
            Span::styled(format!("{} ", dot), Style::default().fg(color)),
            Span::styled(format!("{:<22}", service.label()), Style::default().fg(Color::White)),
            Span::styled(text, Style::default().fg(color)),
        ]));

        if service == ServiceId::ResourceServer {
            if let Some(identity) = &status.identity {
                lines.push(Line::from(Span::styled(
                    format!("    Server ID: {}  Location: {}", identity.id, identity.location),
                    Style::default().fg(Color::Gray),
                )));
            }
        }
    }

    let block = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" System Status "));
    f.render_widget(block, area);
}

/// Draw the notice if one is showing, otherwise key hints for the view
fn draw_bottom_line(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if let Some(notice) = &app.notice {
        let color = match notice.level {
            NoticeLevel::Info => Color::Blue,
            NoticeLevel::Success => Color::Green,
            NoticeLevel::Error => Color::Red,
        };
        (notice.text.clone(), Style::default().fg(color))
    } else {
        let hints = match app.session.view() {
            View::Auth => "Tab:next field │ ←/→:switch panel │ Enter:submit │ Ctrl+C:quit",
            View::Portal => "r:refresh status │ e:export credentials │ l:logout │ q:quit",
        };
        (hints.to_string(), Style::default().fg(Color::DarkGray))
    };

    let bottom = Paragraph::new(text).style(style);
    f.render_widget(bottom, area);
}

/// Shorten long opaque hex strings for display
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
