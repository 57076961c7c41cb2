//! services/dashboard/src/adapters/gotrue.rs
//!
//! This module contains the adapter for the hosted auth service (Supabase
//! GoTrue). It implements the `SessionClient` port from the `core` crate.
//!
//! The adapter owns the session: it is kept in memory, refreshed before it
//! expires, and every change is broadcast to `auth_events` subscribers.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use dashboard_core::domain::{AuthChange, AuthEvent, Credentials, Session, SessionUser};
use dashboard_core::ports::{AuthEventStream, PortError, PortResult, SessionClient};
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How often the background task checks whether the session needs refreshing.
const REFRESH_TICK: std::time::Duration = std::time::Duration::from_secs(30);
/// Sessions closer than this to expiry are refreshed.
const REFRESH_MARGIN_SECS: i64 = 90;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
    created_at: DateTime<Utc>,
    last_sign_in_at: Option<DateTime<Utc>>,
}

impl UserPayload {
    fn to_domain(self) -> SessionUser {
        SessionUser {
            id: self.id,
            email: self.email.filter(|e| !e.is_empty()),
            created_at: self.created_at,
            last_sign_in_at: self.last_sign_in_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    /// Unix seconds.
    expires_at: Option<i64>,
    user: UserPayload,
}

impl TokenPayload {
    fn to_domain(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.to_domain(),
        }
    }
}

/// `/signup` answers with a session when email confirmation is off, and with
/// the bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpPayload {
    Session(TokenPayload),
    User(UserPayload),
    Other(serde::de::IgnoredAny),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    msg: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ErrorPayload {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.is_empty())
    }
}

/// Extracts the human-readable message from an error response body.
pub(crate) fn backend_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .and_then(ErrorPayload::into_message)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}

pub(crate) fn unexpected(e: reqwest::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

async fn read_json<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.map_err(unexpected)?;
        return Err(PortError::Backend(backend_message(status, &body)));
    }
    response.json::<T>().await.map_err(unexpected)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SessionClient` port against the GoTrue REST API.
pub struct GoTrueAdapter {
    http: Client,
    auth_url: String,
    api_key: String,
    session: Arc<RwLock<Option<Session>>>,
    events: broadcast::Sender<AuthChange>,
}

impl GoTrueAdapter {
    /// Creates a new `GoTrueAdapter` for the project at `base_url`.
    pub fn new(http: Client, base_url: &str, api_key: String) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            http,
            auth_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
            api_key,
            session: Arc::new(RwLock::new(None)),
            events,
        }
    }

    /// Spawns the background refresh task. Cancel the returned token to stop it.
    pub fn start_auto_refresh(self: &Arc<Self>) -> CancellationToken {
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let adapter = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(REFRESH_TICK);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        if adapter.needs_refresh(Utc::now()).await {
                            adapter.refresh().await;
                        }
                    }
                }
            }
            debug!("Session auto-refresh stopped");
        });

        token
    }

    fn request(&self, builder: RequestBuilder, bearer: &str) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", bearer))
    }

    fn emit(&self, event: AuthEvent, session: Option<Session>) {
        debug!(?event, "Broadcasting auth change");
        // No subscribers is fine.
        let _ = self.events.send(AuthChange::new(event, session));
    }

    async fn store_session(&self, session: Session, event: AuthEvent) {
        *self.session.write().await = Some(session.clone());
        self.emit(event, Some(session));
    }

    async fn clear_session(&self) {
        let previous = self.session.write().await.take();
        if previous.is_some() {
            self.emit(AuthEvent::SignedOut, None);
        }
    }

    async fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match self.session.read().await.as_ref() {
            Some(session) => is_expiring(session, now),
            None => false,
        }
    }

    /// Exchanges the refresh token for a new session. On rejection the session
    /// is dropped and subscribers see a sign-out. The outcome is only applied
    /// if the session is still the one the refresh started from.
    async fn refresh(&self) -> Option<Session> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.refresh_token.clone());

        let Some(refresh_token) = refresh_token else {
            info!("Session expired with no refresh token");
            self.clear_session().await;
            return None;
        };

        let url = format!("{}/token?grant_type=refresh_token", self.auth_url);
        let result = async {
            let response = self
                .request(self.http.post(&url), &self.api_key)
                .json(&RefreshGrant {
                    refresh_token: &refresh_token,
                })
                .send()
                .await
                .map_err(unexpected)?;
            read_json::<TokenPayload>(response).await
        }
        .await;

        let mut current = self.session.write().await;
        let unchanged = current
            .as_ref()
            .and_then(|s| s.refresh_token.as_deref())
            == Some(refresh_token.as_str());
        if !unchanged {
            debug!("Session changed while refreshing, discarding the result");
            return current.clone();
        }

        match result {
            Ok(payload) => {
                let session = payload.to_domain(Utc::now());
                debug!(user_id = %session.user.id, "Session refreshed");
                *current = Some(session.clone());
                drop(current);
                self.emit(AuthEvent::TokenRefreshed, Some(session.clone()));
                Some(session)
            }
            Err(PortError::Backend(message)) => {
                warn!("Refresh rejected, signing out locally: {}", message);
                *current = None;
                drop(current);
                self.emit(AuthEvent::SignedOut, None);
                None
            }
            Err(e) => {
                // Transient; keep the session and try again on the next tick.
                warn!("Refresh failed: {}", e);
                current.clone()
            }
        }
    }
}

fn is_expiring(session: &Session, now: DateTime<Utc>) -> bool {
    session
        .expires_at
        .is_some_and(|at| at - now <= Duration::seconds(REFRESH_MARGIN_SECS))
}

//=========================================================================================
// `SessionClient` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionClient for GoTrueAdapter {
    async fn get_session(&self) -> PortResult<Option<Session>> {
        if self.needs_refresh(Utc::now()).await {
            return Ok(self.refresh().await);
        }
        Ok(self.session.read().await.clone())
    }

    fn auth_events(&self) -> AuthEventStream {
        let mut rx = self.events.subscribe();
        let session = Arc::clone(&self.session);

        Box::pin(async_stream::stream! {
            let current = session.read().await.clone();
            yield AuthChange::new(AuthEvent::InitialSession, current);

            loop {
                match rx.recv().await {
                    Ok(change) => {
                        yield change;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth event subscriber lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> PortResult<SessionUser> {
        let url = format!("{}/token?grant_type=password", self.auth_url);
        let response = self
            .request(self.http.post(&url), &self.api_key)
            .json(&PasswordGrant {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(unexpected)?;

        let session = read_json::<TokenPayload>(response)
            .await?
            .to_domain(Utc::now());
        let user = session.user.clone();
        self.store_session(session, AuthEvent::SignedIn).await;
        Ok(user)
    }

    async fn sign_up(&self, credentials: &Credentials) -> PortResult<Option<SessionUser>> {
        let url = format!("{}/signup", self.auth_url);
        let response = self
            .request(self.http.post(&url), &self.api_key)
            .json(&PasswordGrant {
                email: &credentials.email,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(unexpected)?;

        match read_json::<SignUpPayload>(response).await? {
            SignUpPayload::Session(payload) => {
                let session = payload.to_domain(Utc::now());
                let user = session.user.clone();
                info!(user_id = %user.id, "Sign-up returned a live session");
                self.store_session(session, AuthEvent::SignedIn).await;
                Ok(Some(user))
            }
            SignUpPayload::User(user) => Ok(Some(user.to_domain())),
            SignUpPayload::Other(_) => Ok(None),
        }
    }

    async fn sign_out(&self) -> PortResult<()> {
        // The local session goes first, whatever the server says.
        let Some(previous) = self.session.write().await.take() else {
            debug!("Sign-out without a session");
            return Ok(());
        };
        self.emit(AuthEvent::SignedOut, None);

        let url = format!("{}/logout", self.auth_url);
        let response = self
            .request(self.http.post(&url), &previous.access_token)
            .send()
            .await
            .map_err(unexpected)?;

        let status = response.status();
        // The token is already dead on the server for these.
        let gone = matches!(
            status,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        );
        if !status.is_success() && !gone {
            let body = response.text().await.map_err(unexpected)?;
            warn!(status = status.as_u16(), "Remote sign-out failed");
            return Err(PortError::Backend(backend_message(status, &body)));
        }
        Ok(())
    }
}
