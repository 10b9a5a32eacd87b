//! Session context and local input validation
//!
//! The browser original kept the authenticated user, session key and
//! smartcard payload in module-level globals. Here they live in an explicit
//! [`SessionContext`] owned by the application, so teardown is clean and the
//! auth flow can be tested without a UI.
//!
//! Invariants:
//! - user id and session key are one value ([`ActiveSession`]); neither can
//!   exist without the other
//! - the issued smartcard is independent of login state: registering does
//!   not authenticate, and a card survives until logout

use thiserror::Error;

use crate::protocol::SmartCard;

/// Minimum accepted password length for registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Credentials of an authenticated session, only ever set together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    pub user_id: String,
    pub session_key: String,
}

/// Smartcard material issued by a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCard {
    pub uid: String,
    pub smartcard: SmartCard,
}

/// Which of the two top-level views is shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Auth,
    Portal,
}

/// Process-wide credential store, lifetime = application run
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    active: Option<ActiveSession>,
    issued: Option<IssuedCard>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the smartcard issued by a registration response
    ///
    /// Does not touch the session: the user still has to log in.
    pub fn store_card(&mut self, uid: String, smartcard: SmartCard) {
        self.issued = Some(IssuedCard { uid, smartcard });
    }

    /// Establish an authenticated session; both fields set atomically
    pub fn establish(&mut self, user_id: String, session_key: String) {
        self.active = Some(ActiveSession {
            user_id,
            session_key,
        });
    }

    /// Logout: clears the session and the issued card together
    pub fn clear(&mut self) {
        self.active = None;
        self.issued = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.active.is_some()
    }

    /// The view that should currently be shown; exactly one at any moment
    pub fn view(&self) -> View {
        if self.is_authenticated() {
            View::Portal
        } else {
            View::Auth
        }
    }

    pub fn current_user_id(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.user_id.as_str())
    }

    pub fn session_key(&self) -> Option<&str> {
        self.active.as_ref().map(|s| s.session_key.as_str())
    }

    pub fn issued_card(&self) -> Option<&IssuedCard> {
        self.issued.as_ref()
    }

    pub fn smartcard(&self) -> Option<&SmartCard> {
        self.issued.as_ref().map(|c| &c.smartcard)
    }
}

/// Validation failures, checked locally before any network call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters long")]
    PasswordTooShort,
}

/// Validate a registration form; checks run in fixed order
pub fn validate_registration(
    user_id: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    if user_id.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// Validate a login form
pub fn validate_login(user_id: &str, password: &str) -> Result<(), ValidationError> {
    if user_id.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    Ok(())
}

/// Strip everything but `[A-Za-z0-9_]` from a user id
///
/// Applied on every keystroke into a user-id field, so invalid characters
/// never appear in the input at all.
pub fn sanitize_user_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_card() -> SmartCard {
        SmartCard {
            w: "w1".into(),
            x: "x2".into(),
            y: "y3".into(),
            z: "z4".into(),
            e: "e5".into(),
        }
    }

    #[test]
    fn test_fresh_context_is_unauthenticated() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.view(), View::Auth);
        assert!(ctx.current_user_id().is_none());
        assert!(ctx.session_key().is_none());
        assert!(ctx.smartcard().is_none());
    }

    #[test]
    fn test_registration_does_not_authenticate() {
        let mut ctx = SessionContext::new();
        ctx.store_card("uid123".into(), sample_card());

        assert!(ctx.smartcard().is_some());
        assert_eq!(ctx.issued_card().unwrap().uid, "uid123");
        // Session fields stay unset; still on the auth view
        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.view(), View::Auth);
    }

    #[test]
    fn test_establish_sets_both_fields_together() {
        let mut ctx = SessionContext::new();
        ctx.establish("alice123".into(), "sk-abc".into());

        assert!(ctx.is_authenticated());
        assert_eq!(ctx.view(), View::Portal);
        assert_eq!(ctx.current_user_id(), Some("alice123"));
        assert_eq!(ctx.session_key(), Some("sk-abc"));
    }

    #[test]
    fn test_logout_clears_everything_together() {
        let mut ctx = SessionContext::new();
        ctx.store_card("uid123".into(), sample_card());
        ctx.establish("alice123".into(), "sk-abc".into());

        ctx.clear();

        assert!(!ctx.is_authenticated());
        assert_eq!(ctx.view(), View::Auth);
        assert!(ctx.current_user_id().is_none());
        assert!(ctx.session_key().is_none());
        assert!(ctx.smartcard().is_none());
    }

    #[test]
    fn test_registration_validation_order() {
        assert_eq!(
            validate_registration("", "secretpw", "secretpw"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_registration("alice", "", ""),
            Err(ValidationError::MissingFields)
        );
        // Mismatch is reported before length
        assert_eq!(
            validate_registration("alice", "abc", "abd"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_registration("alice", "abc", "abc"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(validate_registration("alice", "secretpw", "secretpw"), Ok(()));
    }

    #[test]
    fn test_short_passwords_rejected() {
        for pw in ["a", "ab", "abc", "abcd", "abcde"] {
            assert_eq!(
                validate_registration("alice", pw, pw),
                Err(ValidationError::PasswordTooShort),
                "password {pw:?} should be too short"
            );
        }
        assert_eq!(validate_registration("alice", "abcdef", "abcdef"), Ok(()));
    }

    #[test]
    fn test_login_validation() {
        assert_eq!(validate_login("", "pw"), Err(ValidationError::MissingFields));
        assert_eq!(validate_login("alice", ""), Err(ValidationError::MissingFields));
        assert_eq!(validate_login("alice", "pw"), Ok(()));
    }

    #[test]
    fn test_sanitize_user_id() {
        assert_eq!(sanitize_user_id("alice123"), "alice123");
        assert_eq!(sanitize_user_id("alice_123"), "alice_123");
        assert_eq!(sanitize_user_id("alice 123!"), "alice123");
        assert_eq!(sanitize_user_id("a-b.c@d"), "abcd");
        assert_eq!(sanitize_user_id("ümlaut"), "mlaut");
    }
}
