pub mod api;
pub mod pages;
pub mod state;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

// Re-export the pieces the binaries need to assemble the server.
pub use api::ApiDoc;

/// Builds the page and JSON API routes over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    let pages = Router::new()
        .route("/", get(pages::dashboard))
        .route("/login", get(pages::login_page).post(pages::login_submit))
        .route("/register", get(pages::register_page).post(pages::register_submit))
        .route("/logout", post(pages::logout));

    let api = Router::new()
        .route("/api/auth/state", get(api::auth_state_handler))
        .route("/api/auth/login", post(api::login_handler))
        .route("/api/auth/register", post(api::register_handler))
        .route("/api/auth/logout", post(api::logout_handler));

    Router::new().merge(pages).merge(api).with_state(app_state)
}
