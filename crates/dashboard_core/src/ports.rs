//! crates/dashboard_core/src/ports.rs
//!
//! Defines the service contracts (traits) the dashboard core depends on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! auth state container independent of the hosted backend it talks to.

use crate::domain::{AuthChange, Credentials, ProfileRecord, Session, SessionUser};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// The service answered with an error of its own. The message is shown to
    /// the user verbatim.
    #[error("{0}")]
    Backend(String),
    /// Anything the service did not report itself: transport failures,
    /// undecodable responses.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Stream of session changes pushed by the auth service.
pub type AuthEventStream = Pin<Box<dyn Stream<Item = AuthChange> + Send>>;

/// Outcome of looking up a profile by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileLookup {
    Found(ProfileRecord),
    NotFound,
    Failed(PortError),
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait SessionClient: Send + Sync {
    /// Returns the session currently held by the client, if it is still valid.
    async fn get_session(&self) -> PortResult<Option<Session>>;

    /// Subscribes to session changes. Each call yields an independent stream;
    /// dropping it ends the subscription.
    fn auth_events(&self) -> AuthEventStream;

    async fn sign_in_with_password(&self, credentials: &Credentials) -> PortResult<SessionUser>;

    /// Creates a credential. The principal is absent when the service withholds
    /// it (e.g. an obfuscated response for an already-registered address).
    async fn sign_up(&self, credentials: &Credentials) -> PortResult<Option<SessionUser>>;

    async fn sign_out(&self) -> PortResult<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> ProfileLookup;

    async fn insert(&self, profile: &ProfileRecord) -> PortResult<()>;
}
