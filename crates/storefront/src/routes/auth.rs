//! Authentication route handlers.
//!
//! Signup and login set both session cookies; refresh replaces only the
//! access cookie; logout clears both.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::{REFRESH_TOKEN_COOKIE, RequireAuth, SessionCookies, read_cookie};
use crate::models::UserProfile;
use crate::routes::ApiJson;
use crate::state::AppState;

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn cookies(state: &AppState) -> SessionCookies {
    SessionCookies::new(state.config().is_production())
}

/// Register a customer account and start a session.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse> {
    let (user, pair) = state
        .auth()
        .signup(
            body.name.as_deref().unwrap_or_default(),
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders(cookies(&state).pair(&pair)),
        Json(user.profile()),
    ))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let (user, pair) = state
        .auth()
        .login(
            body.email.as_deref().unwrap_or_default(),
            body.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok((AppendHeaders(cookies(&state).pair(&pair)), Json(user.profile())))
}

/// End the session. Always clears the cookies.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<impl IntoResponse> {
    let refresh_token = read_cookie(&headers, REFRESH_TOKEN_COOKIE);
    state.auth().logout(refresh_token.as_deref()).await?;
    clear_sentry_user();

    Ok((
        AppendHeaders(cookies(&state).cleared()),
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

/// Issue a new access token from the refresh cookie.
pub async fn refresh(State(state): State<AppState>, headers: HeaderMap) -> Result<impl IntoResponse> {
    let refresh_token = read_cookie(&headers, REFRESH_TOKEN_COOKIE);
    let access_token = state.auth().refresh(refresh_token.as_deref()).await?;

    Ok((
        AppendHeaders([(
            axum::http::header::SET_COOKIE,
            cookies(&state).access(&access_token),
        )]),
        Json(json!({ "message": "Token refreshed successfully" })),
    ))
}

/// The authenticated user's profile.
pub async fn profile(RequireAuth(user): RequireAuth) -> Json<UserProfile> {
    Json(user.profile())
}
