//! Session cookies.
//!
//! Both tokens travel as `HttpOnly`, `SameSite=Strict` cookies scoped to `/`,
//! marked `Secure` in production. Their `Max-Age` matches the token lifetime.

use axum::http::{HeaderMap, HeaderValue, header};
use cookie::{Cookie, SameSite};

use crate::services::tokens::{ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS, TokenPair};

/// Cookie holding the access token.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie holding the refresh token.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Builds `Set-Cookie` values for the session tokens.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookies {
    secure: bool,
}

impl SessionCookies {
    #[must_use]
    pub const fn new(secure: bool) -> Self {
        Self { secure }
    }

    fn build(self, name: &'static str, value: String, max_age_secs: i64) -> HeaderValue {
        let cookie = Cookie::build((name, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(cookie::time::Duration::seconds(max_age_secs))
            .build();
        // Token values are base64url JWTs, always valid header bytes.
        HeaderValue::from_str(&cookie.to_string()).unwrap_or_else(|_| HeaderValue::from_static(""))
    }

    /// `Set-Cookie` for a new access token.
    #[must_use]
    pub fn access(self, token: &str) -> HeaderValue {
        self.build(ACCESS_TOKEN_COOKIE, token.to_owned(), ACCESS_TOKEN_TTL_SECS)
    }

    /// `Set-Cookie` values for both tokens of a pair.
    #[must_use]
    pub fn pair(self, pair: &TokenPair) -> [(header::HeaderName, HeaderValue); 2] {
        [
            (header::SET_COOKIE, self.access(&pair.access_token)),
            (
                header::SET_COOKIE,
                self.build(
                    REFRESH_TOKEN_COOKIE,
                    pair.refresh_token.clone(),
                    REFRESH_TOKEN_TTL_SECS,
                ),
            ),
        ]
    }

    /// `Set-Cookie` values that delete both tokens.
    #[must_use]
    pub fn cleared(self) -> [(header::HeaderName, HeaderValue); 2] {
        [
            (
                header::SET_COOKIE,
                self.build(ACCESS_TOKEN_COOKIE, String::new(), 0),
            ),
            (
                header::SET_COOKIE,
                self.build(REFRESH_TOKEN_COOKIE, String::new(), 0),
            ),
        ]
    }
}

/// Read a cookie value from the request headers.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}
