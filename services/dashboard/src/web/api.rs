//! services/dashboard/src/web/api.rs
//!
//! Contains the JSON endpoints over the auth store and the master definition
//! for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use dashboard_core::auth::EMAIL_ALREADY_EXISTS;
use dashboard_core::domain::{AuthState, SessionUser};
use dashboard_core::forms::{LoginForm, RegisterForm};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth_state_handler,
        login_handler,
        register_handler,
        logout_handler,
    ),
    components(
        schemas(
            AuthStateResponse,
            UserResponse,
            LoginRequest,
            RegisterRequest,
            RegisterResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Dashboard Auth API", description = "Session state and sign-in/sign-up/sign-out operations.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Absent fields decode as empty so they fail validation with a 400.
#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

impl From<SessionUser> for UserResponse {
    fn from(user: SessionUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
            last_sign_in_at: user.last_sign_in_at,
        }
    }
}

/// Snapshot of the auth store.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthStateResponse {
    pub user: Option<UserResponse>,
    pub loading: bool,
    pub error: Option<String>,
}

impl From<AuthState> for AuthStateResponse {
    fn from(state: AuthState) -> Self {
        Self {
            user: state.user.map(UserResponse::from),
            loading: state.loading,
            error: state.error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub ok: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/auth/state - Current auth state
#[utoipa::path(
    get,
    path = "/api/auth/state",
    responses(
        (status = 200, description = "Current auth state", body = AuthStateResponse)
    )
)]
pub async fn auth_state_handler(State(state): State<Arc<AppState>>) -> Json<AuthStateResponse> {
    Json(state.auth.state().into())
}

/// POST /api/auth/login - Sign in with email and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthStateResponse),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Sign-in failed; see `error`", body = AuthStateResponse)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let form = LoginForm {
        email: req.email,
        password: req.password,
    };
    form.validate().map_err(bad_request)?;

    state.auth.login(&form.email, &form.password).await;

    let snapshot = state.auth.state();
    let status = if snapshot.user.is_some() {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    Ok((status, Json(AuthStateResponse::from(snapshot))))
}

/// POST /api/auth/register - Create an account and its profile
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created; sign in to continue", body = RegisterResponse),
        (status = 400, description = "Missing fields or short password", body = ErrorResponse),
        (status = 409, description = "Email already exists", body = RegisterResponse),
        (status = 422, description = "Registration rejected by the backend", body = RegisterResponse)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let form = RegisterForm {
        email: req.email,
        password: req.password,
        username: req.username,
    };
    form.validate().map_err(bad_request)?;

    let ok = state
        .auth
        .register(&form.email, &form.password, &form.username)
        .await;
    let error = state.auth.state().error;
    debug!(ok, "Registration handled");

    let status = match (ok, error.as_deref()) {
        (true, _) => StatusCode::CREATED,
        (false, Some(EMAIL_ALREADY_EXISTS)) => StatusCode::CONFLICT,
        (false, _) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    Ok((status, Json(RegisterResponse { ok, error })))
}

/// POST /api/auth/logout - Sign out
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Signed out locally; `error` reports a failed remote sign-out", body = AuthStateResponse)
    )
)]
pub async fn logout_handler(State(state): State<Arc<AppState>>) -> Json<AuthStateResponse> {
    state.auth.logout().await;
    Json(state.auth.state().into())
}
