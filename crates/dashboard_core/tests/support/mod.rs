//! In-memory stand-ins for the hosted auth service and record store.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dashboard_core::{
    AuthChange, AuthEventStream, Credentials, PortError, PortResult, ProfileLookup,
    ProfileRecord, ProfileStore, Session, SessionClient, SessionUser,
};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};
use uuid::Uuid;

pub fn user(email: &str) -> SessionUser {
    SessionUser {
        id: Uuid::new_v4(),
        email: Some(email.to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
        last_sign_in_at: None,
    }
}

pub fn session_for(user: &SessionUser) -> Session {
    Session {
        access_token: "access-token".to_string(),
        refresh_token: Some("refresh-token".to_string()),
        expires_at: None,
        user: user.clone(),
    }
}

/// Parks the next gated call until `release` is notified.
#[derive(Clone)]
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

//=========================================================================================
// Session client
//=========================================================================================

pub struct FakeSessionClient {
    pub session: Mutex<PortResult<Option<Session>>>,
    pub sign_in: Mutex<PortResult<SessionUser>>,
    pub sign_up: Mutex<PortResult<Option<SessionUser>>>,
    pub sign_out: Mutex<PortResult<()>>,
    pub calls: Mutex<Vec<&'static str>>,
    events: broadcast::Sender<AuthChange>,
    gate: Mutex<Option<Gate>>,
}

impl FakeSessionClient {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            session: Mutex::new(Ok(None)),
            sign_in: Mutex::new(Err(PortError::Backend("sign-in not scripted".to_string()))),
            sign_up: Mutex::new(Ok(None)),
            sign_out: Mutex::new(Ok(())),
            calls: Mutex::new(Vec::new()),
            events,
            gate: Mutex::new(None),
        }
    }

    pub fn with_session(self, session: Session) -> Self {
        *self.session.lock().unwrap() = Ok(Some(session));
        self
    }

    pub fn script_sign_in(&self, result: PortResult<SessionUser>) {
        *self.sign_in.lock().unwrap() = result;
    }

    pub fn script_sign_up(&self, result: PortResult<Option<SessionUser>>) {
        *self.sign_up.lock().unwrap() = result;
    }

    pub fn script_sign_out(&self, result: PortResult<()>) {
        *self.sign_out.lock().unwrap() = result;
    }

    /// Holds the next sign-in, sign-up or sign-out call open.
    pub fn hold_next_call(&self) -> Gate {
        let gate = Gate {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn emit(&self, change: AuthChange) {
        let _ = self.events.send(change);
    }

    pub fn listener_count(&self) -> usize {
        self.events.receiver_count()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
    }
}

#[async_trait]
impl SessionClient for FakeSessionClient {
    async fn get_session(&self) -> PortResult<Option<Session>> {
        self.record("get_session");
        self.session.lock().unwrap().clone()
    }

    fn auth_events(&self) -> AuthEventStream {
        let rx = self.events.subscribe();
        Box::pin(futures::stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(change) => return Some((change, rx)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }))
    }

    async fn sign_in_with_password(&self, _credentials: &Credentials) -> PortResult<SessionUser> {
        self.record("sign_in");
        self.pass_gate().await;
        self.sign_in.lock().unwrap().clone()
    }

    async fn sign_up(&self, _credentials: &Credentials) -> PortResult<Option<SessionUser>> {
        self.record("sign_up");
        self.pass_gate().await;
        self.sign_up.lock().unwrap().clone()
    }

    async fn sign_out(&self) -> PortResult<()> {
        self.record("sign_out");
        self.pass_gate().await;
        self.sign_out.lock().unwrap().clone()
    }
}

//=========================================================================================
// Profile store
//=========================================================================================

pub struct FakeProfileStore {
    pub rows: Mutex<Vec<ProfileRecord>>,
    pub lookup_failure: Mutex<Option<PortError>>,
    pub insert_failure: Mutex<Option<PortError>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl FakeProfileStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            lookup_failure: Mutex::new(None),
            insert_failure: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_row(self, email: &str, username: &str) -> Self {
        self.rows.lock().unwrap().push(ProfileRecord {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
        });
        self
    }

    pub fn rows(&self) -> Vec<ProfileRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileStore for FakeProfileStore {
    async fn find_by_email(&self, email: &str) -> ProfileLookup {
        self.calls.lock().unwrap().push("find_by_email");
        if let Some(e) = self.lookup_failure.lock().unwrap().clone() {
            return ProfileLookup::Failed(e);
        }
        match self.rows.lock().unwrap().iter().find(|r| r.email == email) {
            Some(row) => ProfileLookup::Found(row.clone()),
            None => ProfileLookup::NotFound,
        }
    }

    async fn insert(&self, profile: &ProfileRecord) -> PortResult<()> {
        self.calls.lock().unwrap().push("insert");
        if let Some(e) = self.insert_failure.lock().unwrap().clone() {
            return Err(e);
        }
        self.rows.lock().unwrap().push(profile.clone());
        Ok(())
    }
}
