//! services/dashboard/src/web/state.rs
//!
//! Defines the application's shared state.

use dashboard_core::auth::AuthStore;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthStore>,
}

impl AppState {
    pub fn new(auth: Arc<AuthStore>) -> Self {
        Self { auth }
    }
}
