//! services/dashboard/src/web/pages.rs
//!
//! Handlers for the HTML pages. Navigation between pages is expressed as
//! redirects driven by the auth store's `user`.

use crate::web::{state::AppState, views};
use axum::{
    extract::{Form, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use dashboard_core::forms::{display_error, LoginForm, RegisterForm};
use std::sync::Arc;
use tracing::debug;

//=========================================================================================
// Dashboard
//=========================================================================================

/// GET / - The landing page for a signed-in user.
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Response {
    let auth = state.auth.state();
    if auth.loading {
        return Html(views::loading_page("Loading...")).into_response();
    }
    match auth.user {
        Some(user) => Html(views::dashboard_page(&user)).into_response(),
        None => Redirect::to("/login").into_response(),
    }
}

/// POST /logout - Signs out and returns to the login page.
pub async fn logout(State(state): State<Arc<AppState>>) -> Redirect {
    state.auth.logout().await;
    Redirect::to("/login")
}

//=========================================================================================
// Login
//=========================================================================================

/// GET /login
pub async fn login_page(State(state): State<Arc<AppState>>) -> Response {
    let auth = state.auth.state();
    if auth.user.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(views::login_page("", auth.error.as_deref(), auth.loading)).into_response()
}

/// POST /login
pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    if let Err(message) = form.validate() {
        debug!("Login form rejected: {}", message);
        let auth = state.auth.state();
        let error = display_error(Some(message), auth.error.as_deref());
        return Html(views::login_page(&form.email, error, false)).into_response();
    }

    state.auth.login(&form.email, &form.password).await;

    let auth = state.auth.state();
    if auth.user.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(views::login_page(&form.email, auth.error.as_deref(), auth.loading)).into_response()
}

//=========================================================================================
// Register
//=========================================================================================

/// GET /register
pub async fn register_page(State(state): State<Arc<AppState>>) -> Response {
    let auth = state.auth.state();
    if auth.user.is_some() {
        return Redirect::to("/").into_response();
    }
    Html(views::register_page("", "", auth.error.as_deref(), auth.loading)).into_response()
}

/// POST /register
pub async fn register_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RegisterForm>,
) -> Response {
    if let Err(message) = form.validate() {
        debug!("Registration form rejected: {}", message);
        let auth = state.auth.state();
        let error = display_error(Some(message), auth.error.as_deref());
        return Html(views::register_page(&form.email, &form.username, error, false))
            .into_response();
    }

    let registered = state
        .auth
        .register(&form.email, &form.password, &form.username)
        .await;
    if registered {
        return Html(views::registration_complete_page()).into_response();
    }

    let auth = state.auth.state();
    Html(views::register_page(
        &form.email,
        &form.username,
        auth.error.as_deref(),
        auth.loading,
    ))
    .into_response()
}
