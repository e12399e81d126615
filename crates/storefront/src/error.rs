//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; the response body is always `{"message": "..."}`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cache::CacheError;
use crate::db::RepositoryError;
use crate::services::{
    AnalyticsError, AuthError, CartError, CouponError, GuardError, ProductError, TokenError,
};

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cache operation failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Request authentication or authorization failed.
    #[error("Access error: {0}")]
    Guard(#[from] GuardError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Coupon error: {0}")]
    Coupon(#[from] CouponError),

    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    #[error("Product error: {0}")]
    Product(#[from] ProductError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

type Reply = (StatusCode, String);

fn internal() -> Reply {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_owned())
}

fn guard_reply(err: &GuardError) -> Reply {
    match err {
        GuardError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
        GuardError::RequiresRefresh => (
            StatusCode::UNAUTHORIZED,
            "Unauthorized - Access token expired".to_owned(),
        ),
        GuardError::Forbidden => (StatusCode::FORBIDDEN, "Access denied - Admin only".to_owned()),
        GuardError::Repository(_) => internal(),
    }
}

fn auth_reply(err: &AuthError) -> Reply {
    match err {
        AuthError::MissingField(_) => (StatusCode::BAD_REQUEST, capitalize(&err.to_string())),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email address".to_owned()),
        AuthError::UserAlreadyExists => (StatusCode::BAD_REQUEST, "User already exists".to_owned()),
        AuthError::InvalidCredentials => {
            (StatusCode::NOT_FOUND, "Invalid email or password".to_owned())
        }
        AuthError::MissingRefreshToken => {
            (StatusCode::UNAUTHORIZED, "No refresh token provided".to_owned())
        }
        AuthError::Token(TokenError::Invalid | TokenError::Expired | TokenError::Revoked) => {
            (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_owned())
        }
        AuthError::Token(TokenError::Signing(_) | TokenError::Cache(_))
        | AuthError::Repository(_)
        | AuthError::PasswordHash => internal(),
    }
}

fn coupon_reply(err: &CouponError) -> Reply {
    match err {
        CouponError::NotFound => (StatusCode::NOT_FOUND, "Coupon not found".to_owned()),
        CouponError::Expired => (StatusCode::NOT_FOUND, "Coupon expired".to_owned()),
        CouponError::MissingCode | CouponError::AlreadyIssued | CouponError::CodeTaken => {
            (StatusCode::BAD_REQUEST, capitalize(&err.to_string()))
        }
        CouponError::Repository(_) => internal(),
    }
}

fn cart_reply(err: &CartError) -> Reply {
    match err {
        CartError::ProductNotFound(_) => (StatusCode::NOT_FOUND, "Product not found".to_owned()),
        CartError::ItemNotFound(_) => (StatusCode::NOT_FOUND, "Item not in cart".to_owned()),
        CartError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, capitalize(&err.to_string())),
        CartError::Coupon(inner) => coupon_reply(inner),
        CartError::Repository(_) => internal(),
    }
}

fn product_reply(err: &ProductError) -> Reply {
    match err {
        ProductError::NotFound(_) => (StatusCode::NOT_FOUND, "Product not found".to_owned()),
        ProductError::Invalid(msg) => (StatusCode::BAD_REQUEST, capitalize(msg)),
        ProductError::Repository(_) | ProductError::Cache(_) | ProductError::Serialization(_) => {
            internal()
        }
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl AppError {
    /// Status code and client-safe message for this error.
    fn reply(&self) -> Reply {
        match self {
            Self::Database(_) | Self::Cache(_) | Self::Analytics(_) | Self::Internal(_) => {
                internal()
            }
            Self::Guard(err) => guard_reply(err),
            Self::Auth(err) => auth_reply(err),
            Self::Coupon(err) => coupon_reply(err),
            Self::Cart(err) => cart_reply(err),
            Self::Product(err) => product_reply(err),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.reply();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercato_core::ProductId;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn get_message(err: AppError) -> String {
        let body = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        value["message"].as_str().unwrap().to_owned()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_guard_status_codes() {
        assert_eq!(
            get_status(GuardError::Unauthenticated.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(GuardError::RequiresRefresh.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(GuardError::Forbidden.into()), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_auth_status_codes() {
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::MissingField("name").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::InvalidCredentials.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AuthError::Token(TokenError::Revoked).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AuthError::PasswordHash.into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_coupon_and_cart_status_codes() {
        assert_eq!(get_status(CouponError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(get_status(CouponError::Expired.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(CartError::Coupon(CouponError::Expired).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::ItemNotFound(ProductId::new(1)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::InvalidQuantity(u32::MAX).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ProductError::Invalid("name is required".to_owned()).into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_messages_are_client_safe() {
        assert_eq!(get_message(CouponError::Expired.into()).await, "Coupon expired");
        assert_eq!(
            get_message(GuardError::RequiresRefresh.into()).await,
            "Unauthorized - Access token expired"
        );
        assert_eq!(
            get_message(AuthError::MissingField("email").into()).await,
            "Email is required"
        );
        assert_eq!(
            get_message(AppError::Internal("pool exhausted at 10.0.0.3".to_owned())).await,
            INTERNAL_MESSAGE
        );
    }
}
