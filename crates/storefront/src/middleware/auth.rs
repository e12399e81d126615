//! Authentication extractors.
//!
//! [`RequireAuth`] resolves the `accessToken` cookie to a user through the
//! access guard; [`RequireAdmin`] additionally applies the admin role check.
//! Rejections are ordinary [`AppError`]s, so clients get the usual JSON body.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::{AppError, set_sentry_user};
use crate::middleware::cookies::{ACCESS_TOKEN_COOKIE, read_cookie};
use crate::models::User;
use crate::services::require_admin;
use crate::state::AppState;

/// Extractor that requires an authenticated user.
///
/// # Example
///
/// ```rust,ignore
/// async fn profile(RequireAuth(user): RequireAuth) -> Json<UserProfile> {
///     Json(user.profile())
/// }
/// ```
pub struct RequireAuth(pub User);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = read_cookie(&parts.headers, ACCESS_TOKEN_COOKIE);
        let user = state.guard().authenticate(token.as_deref()).await?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(user))
    }
}

/// Extractor that requires an authenticated administrator.
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        require_admin(&user)?;
        Ok(Self(user))
    }
}
