//! Keyboard input handling
//!
//! Dispatch follows the active view: form editing on the auth view, action
//! keys on the portal view. User-id fields filter every keystroke down to
//! `[A-Za-z0-9_]`, so the constraint is enforced at entry rather than at
//! submit time.

use crossterm::event::{KeyCode, KeyEvent};
use medisecure_core::session::View;

use crate::app::{App, AppResult, AuthTab, LoginField, RegisterField};

/// Handle a key event
pub fn handle_key(app: &mut App, key: KeyEvent) -> AppResult {
    match app.session.view() {
        View::Auth => handle_auth_view(app, key),
        View::Portal => handle_portal_view(app, key),
    }
}

/// Keys on the auth view (login/register forms)
fn handle_auth_view(app: &mut App, key: KeyEvent) -> AppResult {
    match key.code {
        KeyCode::Esc => {
            app.dismiss_notice();
        }

        // Switch between the login and register panels
        KeyCode::Left | KeyCode::Right => {
            app.auth_tab = match app.auth_tab {
                AuthTab::Login => AuthTab::Register,
                AuthTab::Register => AuthTab::Login,
            };
        }

        // Field focus
        KeyCode::Tab | KeyCode::Down => focus_next(app),
        KeyCode::BackTab | KeyCode::Up => focus_prev(app),

        KeyCode::Enter => match app.auth_tab {
            AuthTab::Login => app.submit_login(),
            AuthTab::Register => app.submit_registration(),
        },

        KeyCode::Backspace => {
            focused_field(app).pop();
        }

        KeyCode::Char(c) => {
            let user_id_focused = is_user_id_focused(app);
            let field = focused_field(app);
            // User-id fields accept only alphanumeric + underscore
            if !user_id_focused || c.is_ascii_alphanumeric() || c == '_' {
                field.push(c);
            }
        }

        _ => {}
    }

    AppResult::Continue
}

/// Keys on the portal view
fn handle_portal_view(app: &mut App, key: KeyEvent) -> AppResult {
    match key.code {
        KeyCode::Char('r') => {
            app.refresh_status();
        }
        KeyCode::Char('e') => {
            app.export_credentials();
        }
        KeyCode::Char('l') => {
            app.logout();
        }
        KeyCode::Esc => {
            app.dismiss_notice();
        }
        _ => {}
    }

    AppResult::Continue
}

fn focus_next(app: &mut App) {
    match app.auth_tab {
        AuthTab::Login => {
            app.login_form.focus = match app.login_form.focus {
                LoginField::UserId => LoginField::Password,
                LoginField::Password => LoginField::UserId,
            };
        }
        AuthTab::Register => {
            app.register_form.focus = match app.register_form.focus {
                RegisterField::UserId => RegisterField::Password,
                RegisterField::Password => RegisterField::Confirm,
                RegisterField::Confirm => RegisterField::UserId,
            };
        }
    }
}

fn focus_prev(app: &mut App) {
    match app.auth_tab {
        AuthTab::Login => focus_next(app),
        AuthTab::Register => {
            app.register_form.focus = match app.register_form.focus {
                RegisterField::UserId => RegisterField::Confirm,
                RegisterField::Password => RegisterField::UserId,
                RegisterField::Confirm => RegisterField::Password,
            };
        }
    }
}

fn is_user_id_focused(app: &App) -> bool {
    match app.auth_tab {
        AuthTab::Login => app.login_form.focus == LoginField::UserId,
        AuthTab::Register => app.register_form.focus == RegisterField::UserId,
    }
}

fn focused_field(app: &mut App) -> &mut String {
    match app.auth_tab {
        AuthTab::Login => match app.login_form.focus {
            LoginField::UserId => &mut app.login_form.user_id,
            LoginField::Password => &mut app.login_form.password,
        },
        AuthTab::Register => match app.register_form.focus {
            RegisterField::UserId => &mut app.register_form.user_id,
            RegisterField::Password => &mut app.register_form.password,
            RegisterField::Confirm => &mut app.register_form.confirm,
        },
    }
}
