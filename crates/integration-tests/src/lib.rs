//! Integration tests for Mercato.
//!
//! Tests drive the full storefront router in-process with
//! `tower::ServiceExt::oneshot`, backed by the in-memory store and cache, so
//! no database or Redis is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mercato-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Signup, login, refresh, logout, token expiry
//! - `cart_coupons` - Cart pricing and coupon application
//! - `catalog_admin` - Product catalogue, admin gating, analytics

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use cookie::Cookie;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use mercato_core::{Email, UserRole};
use mercato_storefront::cache::MemoryCache;
use mercato_storefront::config::{Environment, StorefrontConfig};
use mercato_storefront::db::{MemoryStore, Stores, UserStore};
use mercato_storefront::middleware::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use mercato_storefront::routes;
use mercato_storefront::state::AppState;

/// A password that passes signup validation.
pub const PASSWORD: &str = "correct-horse-battery";

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused".to_owned()),
        redis_url: None,
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        environment: Environment::Development,
        static_dir: PathBuf::from("frontend/dist"),
        access_token_secret: SecretString::from("kQ7#vL2pX9$mN4wR8zT1yB6cF3hJ5dG0".to_owned()),
        refresh_token_secret: SecretString::from("Zt4!sW8eQ1rY7uI3oP6aS9dF2gH5jK0x".to_owned()),
        featured_cache_ttl: None,
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Session cookies captured from a response.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = [
            (ACCESS_TOKEN_COOKIE, &self.access_token),
            (REFRESH_TOKEN_COOKIE, &self.refresh_token),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
        .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

/// A response with its body decoded as JSON (`Null` when empty).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub set_cookies: Vec<Cookie<'static>>,
    pub body: Value,
}

impl TestResponse {
    /// The `message` field of an error or status body.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    /// The `Set-Cookie` entry for `name`, if any.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&Cookie<'static>> {
        self.set_cookies.iter().find(|c| c.name() == name)
    }

    /// Session tokens set by this response.
    #[must_use]
    pub fn session(&self) -> Session {
        Session {
            access_token: self.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_owned()),
            refresh_token: self.cookie(REFRESH_TOKEN_COOKIE).map(|c| c.value().to_owned()),
        }
    }
}

/// Read a JSON money amount.
#[must_use]
pub fn money(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().unwrap(),
        other => other.to_string().parse().unwrap(),
    }
}

/// In-process storefront with direct access to its backing store.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    app: Router,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            test_config(),
            Stores::from_memory(Arc::clone(&store)),
            Arc::new(MemoryCache::new()),
        );
        let app = routes::router(state.clone());
        Self { state, store, app }
    }

    /// Send a request, optionally with a JSON body and session cookies.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        session: Option<&Session>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookies) = session.and_then(Session::cookie_header) {
            builder = builder.header(header::COOKIE, cookies);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| Cookie::parse(v.to_str().unwrap().to_owned()).unwrap())
            .collect();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            set_cookies,
            body,
        }
    }

    pub async fn get(&self, uri: &str, session: Option<&Session>) -> TestResponse {
        self.send(Method::GET, uri, None, session).await
    }

    pub async fn post(&self, uri: &str, body: Value, session: Option<&Session>) -> TestResponse {
        self.send(Method::POST, uri, Some(body), session).await
    }

    /// Sign up a customer and return their session.
    pub async fn signup(&self, name: &str, email: &str) -> Session {
        let response = self
            .post(
                "/api/auth/signup",
                serde_json::json!({ "name": name, "email": email, "password": PASSWORD }),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.session()
    }

    /// Sign up a user and grant them the admin role.
    pub async fn admin(&self, email: &str) -> Session {
        let session = self.signup("Admin", email).await;
        UserStore::set_role(
            self.store.as_ref(),
            &Email::parse(email).unwrap(),
            UserRole::Admin,
        )
        .await
        .unwrap();
        session
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
