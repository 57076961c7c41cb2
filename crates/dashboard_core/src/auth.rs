//! crates/dashboard_core/src/auth.rs
//!
//! The auth state container: the single source of truth for "who is signed
//! in". Every call to the session client and profile store goes through here,
//! and every outcome is folded into an [`AuthState`] that views observe.
//!
//! Operations never return errors to the caller. Failures land in
//! `AuthState::error`; `register` additionally reports success as a `bool`.
//! Concurrent operations are not serialized, so their writes interleave in
//! completion order.

use crate::domain::{AuthChange, AuthState, Credentials, ProfileRecord};
use crate::ports::{PortError, ProfileLookup, ProfileStore, SessionClient};
use futures::StreamExt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const EMAIL_ALREADY_EXISTS: &str = "Email already exists";
pub const LOGIN_UNEXPECTED: &str = "An unexpected error occurred during login";
pub const REGISTER_UNEXPECTED: &str = "An unexpected error occurred during registration";
pub const LOGOUT_UNEXPECTED: &str = "An unexpected error occurred during logout";

/// Owns the process-wide [`AuthState`] and the auth-change listener.
pub struct AuthStore {
    client: Arc<dyn SessionClient>,
    profiles: Arc<dyn ProfileStore>,
    state: Arc<watch::Sender<AuthState>>,
    /// Cancels the listener task; `Some` while attached.
    listener: Mutex<Option<CancellationToken>>,
}

impl AuthStore {
    pub fn new(client: Arc<dyn SessionClient>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self {
            client,
            profiles,
            state: Arc::new(state),
            listener: Mutex::new(None),
        }
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn is_attached(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    //=====================================================================================
    // Lifecycle
    //=====================================================================================

    /// Starts listening for session changes and restores the current session.
    ///
    /// Must be called from within a tokio runtime. A second call while already
    /// attached re-fetches the session but keeps the existing listener.
    pub async fn attach(&self) {
        self.start_listener();

        let session = match self.client.get_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("Failed to restore session, treating as signed out: {}", e);
                None
            }
        };

        match &session {
            Some(s) => info!(user_id = %s.user.id, "Restored existing session"),
            None => debug!("No existing session"),
        }

        self.state.send_modify(|s| {
            s.user = session.map(|session| session.user);
            s.loading = false;
        });
    }

    /// Stops the listener. Safe to call repeatedly.
    pub fn detach(&self) {
        let token = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = token {
            token.cancel();
            info!("Auth listener detached");
        }
    }

    fn start_listener(&self) {
        let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            debug!("Auth listener already attached");
            return;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let mut events = self.client.auth_events();
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    change = events.next() => match change {
                        Some(change) => apply_change(&state, change),
                        None => {
                            debug!("Auth event stream ended");
                            break;
                        }
                    },
                }
            }
        });

        *slot = Some(token);
        info!("Auth listener attached");
    }

    //=====================================================================================
    // Operations
    //=====================================================================================

    pub async fn login(&self, email: &str, password: &str) {
        self.begin();
        debug!(email, "Signing in");

        let credentials = Credentials::new(email, password);
        match self.client.sign_in_with_password(&credentials).await {
            Ok(user) => {
                info!(user_id = %user.id, "Signed in");
                self.state.send_modify(|s| {
                    s.user = Some(user);
                    s.loading = false;
                });
            }
            Err(e) => {
                warn!(email, "Sign-in failed: {}", e);
                self.fail(surface(&e, LOGIN_UNEXPECTED));
            }
        }
    }

    /// Registers a credential and its profile row. Returns `true` on success.
    ///
    /// Success does not sign the user in; the caller is expected to send them
    /// to the login page.
    pub async fn register(&self, email: &str, password: &str, username: &str) -> bool {
        self.begin();
        debug!(email, username, "Registering");

        match self.try_register(email, password, username).await {
            Ok(()) => {
                info!(email, "Registration complete");
                self.state.send_modify(|s| s.loading = false);
                true
            }
            Err(message) => {
                warn!(email, "Registration failed: {}", message);
                self.fail(message);
                false
            }
        }
    }

    async fn try_register(&self, email: &str, password: &str, username: &str) -> Result<(), String> {
        match self.profiles.find_by_email(email).await {
            ProfileLookup::Found(_) => return Err(EMAIL_ALREADY_EXISTS.to_string()),
            ProfileLookup::Failed(e) => return Err(surface(&e, REGISTER_UNEXPECTED)),
            ProfileLookup::NotFound => {}
        }

        let credentials = Credentials::new(email, password);
        let user = self
            .client
            .sign_up(&credentials)
            .await
            .map_err(|e| surface(&e, REGISTER_UNEXPECTED))?;

        if let Some(user) = user {
            let profile = ProfileRecord {
                id: user.id,
                email: email.to_string(),
                username: username.to_string(),
            };
            self.profiles
                .insert(&profile)
                .await
                .map_err(|e| surface(&e, REGISTER_UNEXPECTED))?;
        } else {
            debug!(email, "Sign-up returned no principal; skipping profile insert");
        }

        Ok(())
    }

    /// Signs out. Local state always ends up signed out, even when the remote
    /// call fails.
    pub async fn logout(&self) {
        self.begin();
        debug!("Signing out");

        let error = match self.client.sign_out().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Sign-out failed: {}", e);
                Some(surface(&e, LOGOUT_UNEXPECTED))
            }
        };

        self.state.send_modify(|s| {
            s.user = None;
            s.error = error;
            s.loading = false;
        });
        info!("Signed out");
    }

    fn begin(&self) {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn fail(&self, message: String) {
        self.state.send_modify(|s| {
            s.error = Some(message);
            s.loading = false;
        });
    }
}

impl Drop for AuthStore {
    fn drop(&mut self) {
        self.detach();
    }
}

fn apply_change(state: &watch::Sender<AuthState>, change: AuthChange) {
    debug!(event = ?change.event, "Auth state changed");
    let user = change.session.map(|session| session.user);
    state.send_modify(|s| {
        s.user = user;
        s.loading = false;
    });
}

/// Backend messages pass through verbatim; anything else becomes `fallback`.
fn surface(err: &PortError, fallback: &str) -> String {
    match err {
        PortError::Backend(message) => message.clone(),
        PortError::Unexpected(_) => fallback.to_string(),
    }
}
