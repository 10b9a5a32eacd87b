//! Application state and the auth flow
//!
//! Registration and login run as spawned tasks against the middleware; each
//! task always sends exactly one completion event back over the app channel,
//! and handling that event is the only place the in-flight marker is
//! cleared, so the processing state cannot leak whether the request
//! succeeded, was rejected, or never reached the server.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

use medisecure_core::client::{ApiError, MiddlewareClient};
use medisecure_core::config::Config;
use medisecure_core::export::export_card;
use medisecure_core::monitor::{self, MonitorEndpoints, MonitorHandle, ProbeOutcome, StatusBoard};
use medisecure_core::protocol::{AuthResponse, RegisterResponse};
use medisecure_core::session::{validate_login, validate_registration, SessionContext, View};

/// Application result for main loop
pub enum AppResult {
    Continue,
    Quit,
}

/// Which auth panel is active
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthTab {
    #[default]
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginField {
    #[default]
    UserId,
    Password,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegisterField {
    #[default]
    UserId,
    Password,
    Confirm,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub user_id: String,
    pub password: String,
    pub focus: LoginField,
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub user_id: String,
    pub password: String,
    pub confirm: String,
    pub focus: RegisterField,
}

/// Auth operation currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOp {
    Register,
    Login,
}

/// Notice message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A dismissible one-line message below the active view
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    shown_at: Instant,
}

/// Completion events from spawned auth tasks
#[derive(Debug)]
pub enum AppEvent {
    Registered(Result<RegisterResponse, ApiError>),
    LoggedIn {
        user_id: String,
        result: Result<AuthResponse, ApiError>,
    },
}

/// Main application struct
pub struct App {
    /// Configuration
    pub config: Config,

    /// Credential store
    pub session: SessionContext,

    /// Health monitor status, projected by the UI
    pub board: StatusBoard,

    pub auth_tab: AuthTab,
    pub login_form: LoginForm,
    pub register_form: RegisterForm,

    /// Set while a register/login request is in flight; advisory guard
    /// against double submission, cleared by the completion event
    pub in_flight: Option<AuthOp>,

    pub notice: Option<Notice>,

    client: MiddlewareClient,
    events_tx: mpsc::Sender<AppEvent>,
    events_rx: mpsc::Receiver<AppEvent>,
    probe_tx: mpsc::Sender<ProbeOutcome>,
    probe_rx: mpsc::Receiver<ProbeOutcome>,
    monitor: Option<MonitorHandle>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let client = MiddlewareClient::new(&config.endpoints.middleware_url);
        let (events_tx, events_rx) = mpsc::channel(32);
        let (probe_tx, probe_rx) = mpsc::channel(32);

        Self {
            config,
            session: SessionContext::new(),
            board: StatusBoard::new(),
            auth_tab: AuthTab::default(),
            login_form: LoginForm::default(),
            register_form: RegisterForm::default(),
            in_flight: None,
            notice: None,
            client,
            events_tx,
            events_rx,
            probe_tx,
            probe_rx,
            monitor: None,
        }
    }

    /// Whether a bare `q` should quit (only in the portal view, where no
    /// text field can swallow it)
    pub fn can_quit_with_q(&self) -> bool {
        self.session.view() == View::Portal
    }

    /// Drain async completions and expire the notice; called every loop pass
    pub fn tick(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
        while let Ok(outcome) = self.probe_rx.try_recv() {
            self.board.apply(outcome);
        }

        let dismiss_after = Duration::from_secs(self.config.client.notice_dismiss_secs);
        if let Some(notice) = &self.notice {
            if notice.shown_at.elapsed() >= dismiss_after {
                self.notice = None;
            }
        }
    }

    /// Submit the registration form
    ///
    /// Validation runs locally first; on violation nothing is sent.
    pub fn submit_registration(&mut self) {
        if self.in_flight.is_some() {
            return;
        }

        let user_id = self.register_form.user_id.trim().to_string();
        let password = self.register_form.password.clone();
        let confirm = self.register_form.confirm.clone();

        if let Err(err) = validate_registration(&user_id, &password, &confirm) {
            self.show_notice(err.to_string(), NoticeLevel::Error);
            return;
        }

        self.notice = None;
        self.in_flight = Some(AuthOp::Register);

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.register(&user_id, &password).await;
            let _ = tx.send(AppEvent::Registered(result)).await;
        });
    }

    /// Submit the login form
    pub fn submit_login(&mut self) {
        if self.in_flight.is_some() {
            return;
        }

        let user_id = self.login_form.user_id.trim().to_string();
        let password = self.login_form.password.clone();

        if let Err(err) = validate_login(&user_id, &password) {
            self.show_notice(err.to_string(), NoticeLevel::Error);
            return;
        }

        self.notice = None;
        self.in_flight = Some(AuthOp::Login);

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = client.authenticate(&user_id, &password).await;
            let _ = tx.send(AppEvent::LoggedIn { user_id, result }).await;
        });
    }

    /// Apply one completion event
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Registered(result) => {
                self.in_flight = None;
                match result {
                    Ok(resp) => {
                        self.session.store_card(resp.uid, resp.smartcard);
                        self.register_form = RegisterForm::default();
                        self.auth_tab = AuthTab::Login;
                        self.show_notice(
                            "Registration successful. Sign in to continue.",
                            NoticeLevel::Success,
                        );
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "registration failed");
                        self.show_notice(err.to_string(), NoticeLevel::Error);
                    }
                }
            }
            AppEvent::LoggedIn { user_id, result } => {
                self.in_flight = None;
                match result {
                    Ok(resp) => {
                        self.session.establish(user_id, resp.session_key);
                        self.login_form = LoginForm::default();
                        self.notice = None;
                        self.start_monitor();
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "authentication failed");
                        self.show_notice(err.to_string(), NoticeLevel::Error);
                    }
                }
            }
        }
    }

    /// Logout: no network call; clears all credential state and stops the
    /// health monitor
    pub fn logout(&mut self) {
        self.stop_monitor();
        self.session.clear();
        self.board = StatusBoard::new();
        self.notice = None;
    }

    /// Run an extra health-check pass without touching the schedule
    pub fn refresh_status(&mut self) {
        if let Some(monitor) = &self.monitor {
            monitor.refresh();
        }
    }

    /// Write the issued smartcard to disk; silent no-op without one
    pub fn export_credentials(&mut self) {
        let Some(artifact) = export_card(self.session.smartcard(), chrono::Utc::now()) else {
            return;
        };

        let dir = self
            .config
            .client
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));

        match artifact.write_to(&dir) {
            Ok(path) => self.show_notice(
                format!("Credentials exported to {}", path.display()),
                NoticeLevel::Success,
            ),
            Err(err) => self.show_notice(err.to_string(), NoticeLevel::Error),
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn monitor_running(&self) -> bool {
        self.monitor.is_some()
    }

    fn show_notice(&mut self, text: impl Into<String>, level: NoticeLevel) {
        self.notice = Some(Notice {
            text: text.into(),
            level,
            shown_at: Instant::now(),
        });
    }

    fn start_monitor(&mut self) {
        self.stop_monitor();
        self.board = StatusBoard::new();

        let endpoints = MonitorEndpoints {
            middleware_url: self.config.endpoints.middleware_url.clone(),
            registration_center_url: self.config.endpoints.registration_center_url.clone(),
            resource_server_url: self.config.endpoints.resource_server_url.clone(),
        };
        let interval = Duration::from_secs(self.config.client.status_poll_secs);

        self.monitor = Some(monitor::spawn(
            self.client.http().clone(),
            endpoints,
            interval,
            self.probe_tx.clone(),
        ));
    }

    fn stop_monitor(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medisecure_core::protocol::SmartCard;

    fn sample_card() -> SmartCard {
        SmartCard {
            w: "w1".into(),
            x: "x2".into(),
            y: "y3".into(),
            z: "z4".into(),
            e: "e5".into(),
        }
    }

    fn registered_ok(uid: &str) -> AppEvent {
        AppEvent::Registered(Ok(RegisterResponse {
            uid: uid.into(),
            smartcard: sample_card(),
        }))
    }

    fn logged_in_ok(user_id: &str, key: &str) -> AppEvent {
        AppEvent::LoggedIn {
            user_id: user_id.into(),
            result: Ok(AuthResponse {
                session_key: key.into(),
            }),
        }
    }

    #[test]
    fn test_short_password_blocks_submission() {
        let mut app = App::new(Config::default());
        app.register_form.user_id = "alice123".into();
        app.register_form.password = "abc".into();
        app.register_form.confirm = "abc".into();

        app.submit_registration();

        // Nothing went out; no processing state, only the validation notice
        assert!(app.in_flight.is_none());
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("at least 6"));
    }

    #[test]
    fn test_password_mismatch_blocks_submission() {
        let mut app = App::new(Config::default());
        app.register_form.user_id = "alice123".into();
        app.register_form.password = "secretpw".into();
        app.register_form.confirm = "secretpX".into();

        app.submit_registration();

        assert!(app.in_flight.is_none());
        assert_eq!(app.notice.as_ref().unwrap().text, "Passwords do not match");
    }

    #[test]
    fn test_registration_success_does_not_authenticate() {
        let mut app = App::new(Config::default());
        app.in_flight = Some(AuthOp::Register);

        app.handle_event(registered_ok("uid123"));

        assert!(app.in_flight.is_none());
        assert!(app.session.smartcard().is_some());
        assert!(!app.session.is_authenticated());
        assert_eq!(app.session.view(), View::Auth);
        // Form cleared, user pointed back at the login panel
        assert!(app.register_form.user_id.is_empty());
        assert_eq!(app.auth_tab, AuthTab::Login);
    }

    #[test]
    fn test_registration_failure_clears_processing_state() {
        let mut app = App::new(Config::default());
        app.in_flight = Some(AuthOp::Register);

        app.handle_event(AppEvent::Registered(Err(ApiError::Rejected(
            "User already exists".into(),
        ))));

        assert!(app.in_flight.is_none());
        assert_eq!(app.notice.as_ref().unwrap().text, "User already exists");
        assert!(app.session.smartcard().is_none());
    }

    #[tokio::test]
    async fn test_login_success_establishes_session_and_monitor() {
        let mut app = App::new(Config::default());
        app.in_flight = Some(AuthOp::Login);

        app.handle_event(logged_in_ok("alice123", "sk-abc"));

        assert!(app.in_flight.is_none());
        assert_eq!(app.session.current_user_id(), Some("alice123"));
        assert_eq!(app.session.session_key(), Some("sk-abc"));
        assert_eq!(app.session.view(), View::Portal);
        assert!(app.monitor_running());

        app.logout();
    }

    #[test]
    fn test_login_failure_leaves_no_partial_session() {
        let mut app = App::new(Config::default());
        app.in_flight = Some(AuthOp::Login);

        app.handle_event(AppEvent::LoggedIn {
            user_id: "alice123".into(),
            result: Err(ApiError::Rejected("Authentication failed".into())),
        });

        assert!(app.in_flight.is_none());
        assert!(!app.session.is_authenticated());
        assert!(app.session.current_user_id().is_none());
        assert!(app.session.session_key().is_none());
    }

    #[tokio::test]
    async fn test_register_login_logout_scenario() {
        let mut app = App::new(Config::default());

        // Register alice123: card populated, no session
        app.handle_event(registered_ok("uid123"));
        assert!(app.session.smartcard().is_some());
        assert!(!app.session.is_authenticated());

        // Login: session established, portal shown, monitor running
        app.handle_event(logged_in_ok("alice123", "sk-abc"));
        assert_eq!(app.session.view(), View::Portal);
        assert!(app.monitor_running());

        // Logout: back to auth view, all credential state gone
        app.logout();
        assert_eq!(app.session.view(), View::Auth);
        assert!(app.session.current_user_id().is_none());
        assert!(app.session.session_key().is_none());
        assert!(app.session.smartcard().is_none());
        assert!(!app.monitor_running());
    }

    #[tokio::test]
    async fn test_submit_ignored_while_in_flight() {
        let mut app = App::new(Config::default());
        app.login_form.user_id = "alice123".into();
        app.login_form.password = "secretpw".into();

        app.submit_login();
        assert_eq!(app.in_flight, Some(AuthOp::Login));

        // Second submit neither cancels nor restacks the first attempt
        app.submit_login();
        assert_eq!(app.in_flight, Some(AuthOp::Login));
    }

    #[test]
    fn test_export_without_card_is_silent() {
        let mut app = App::new(Config::default());
        app.export_credentials();
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_export_after_registration_writes_file() {
        let dir = std::env::temp_dir().join(format!("medisecure-app-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut config = Config::default();
        config.client.export_dir = Some(dir.clone());
        let mut app = App::new(config);
        app.handle_event(registered_ok("uid123"));

        app.export_credentials();

        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);

        let exported: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(exported.len(), 1);
        assert!(exported[0].starts_with("smartcard-credentials-"));
        assert!(exported[0].ends_with(".json"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
