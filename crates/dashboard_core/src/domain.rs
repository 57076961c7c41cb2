//! crates/dashboard_core/src/domain.rs
//!
//! Defines the pure, core data structures for the dashboard.
//! These structs are independent of the hosted backend's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The authenticated principal as reported by the hosted auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Absent for a first-ever session.
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl SessionUser {
    /// The most recent sign-in, falling back to the account creation time.
    pub fn last_seen_at(&self) -> DateTime<Utc> {
        self.last_sign_in_at.unwrap_or(self.created_at)
    }
}

/// A backend-issued session. Owned by the session client adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub user: SessionUser,
}

// Email/password pair handed to sign-in and sign-up.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Application-level row linking a principal to an email and username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

/// The kind of session change the auth service announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

/// A single notification from the auth-change stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl AuthChange {
    pub fn new(event: AuthEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }

    /// The principal carried by the notification, if any.
    pub fn user(&self) -> Option<&SessionUser> {
        self.session.as_ref().map(|s| &s.user)
    }
}

/// The observable authentication state shared by every view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub user: Option<SessionUser>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for AuthState {
    // Loading until the first session fetch completes.
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
            error: None,
        }
    }
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(last_sign_in_at: Option<DateTime<Utc>>) -> SessionUser {
        SessionUser {
            id: Uuid::new_v4(),
            email: Some("a@x.com".to_string()),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            last_sign_in_at,
        }
    }

    #[test]
    fn last_seen_prefers_last_sign_in() {
        let signed_in = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(user(Some(signed_in)).last_seen_at(), signed_in);
    }

    #[test]
    fn last_seen_falls_back_to_creation_time() {
        let u = user(None);
        assert_eq!(u.last_seen_at(), u.created_at);
    }

    #[test]
    fn default_state_is_loading_without_user() {
        let state = AuthState::default();
        assert!(state.loading);
        assert!(!state.is_authenticated());
        assert!(state.error.is_none());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let creds = Credentials::new("a@x.com", "hunter22");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("a@x.com"));
        assert!(!rendered.contains("hunter22"));
    }

    #[test]
    fn auth_event_serializes_in_screaming_case() {
        let json = serde_json::to_string(&AuthEvent::TokenRefreshed).unwrap();
        assert_eq!(json, "\"TOKEN_REFRESHED\"");
    }
}
