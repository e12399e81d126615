//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness
//! GET    /health/ready                   - Store readiness
//!
//! # Auth
//! POST   /api/auth/signup                - Create account, set cookies
//! POST   /api/auth/login                 - Log in, set cookies
//! POST   /api/auth/logout                - Revoke refresh token, clear cookies
//! POST   /api/auth/refresh               - New access token from refresh cookie
//! GET    /api/auth/profile               - Current user (auth)
//!
//! # Coupons (auth)
//! GET    /api/coupons                    - Active coupon or null
//! POST   /api/coupons/validate           - Check a code
//!
//! # Cart (auth)
//! GET    /api/cart                       - Cart view
//! POST   /api/cart                       - Add one unit
//! DELETE /api/cart                       - Remove a line, or clear
//! PUT    /api/cart/{productId}           - Set quantity
//! POST   /api/cart/coupon                - Apply coupon
//! DELETE /api/cart/coupon                - Remove coupon
//!
//! # Products
//! GET    /api/products                   - All products (admin)
//! POST   /api/products                   - Create (admin)
//! GET    /api/products/featured          - Featured (cached)
//! GET    /api/products/recommendations   - Random picks
//! GET    /api/products/category/{category}
//! PATCH  /api/products/{id}              - Toggle featured (admin)
//! DELETE /api/products/{id}              - Delete (admin)
//!
//! # Analytics (admin)
//! GET    /api/analytics                  - Summary and daily sales
//! ```

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod products;

use axum::{
    Json, Router,
    extract::{FromRequest, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// JSON body extractor whose rejections use the API error format.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .route("/profile", get(auth::profile))
}

/// Create the coupon routes router.
pub fn coupon_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(coupons::active))
        .route("/validate", post(coupons::validate))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add).delete(cart::remove))
        .route(
            "/coupon",
            post(cart::apply_coupon).delete(cart::remove_coupon),
        )
        .route("/{product_id}", put(cart::update_quantity))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route("/featured", get(products::featured))
        .route("/recommendations", get(products::recommendations))
        .route("/category/{category}", get(products::by_category))
        .route(
            "/{id}",
            patch(products::toggle_featured).delete(products::delete),
        )
}

fn api_routes(rate_limited: bool) -> Router<AppState> {
    let mut auth = auth_routes();
    let mut rest = Router::new()
        .nest("/coupons", coupon_routes())
        .nest("/cart", cart_routes())
        .nest("/products", product_routes())
        .route("/analytics", get(analytics::dashboard));

    if rate_limited {
        match (auth_rate_limiter(), api_rate_limiter()) {
            (Some(auth_limit), Some(api_limit)) => {
                auth = auth.layer(auth_limit);
                rest = rest.layer(api_limit);
            }
            _ => tracing::warn!("Rate limiter configuration rejected, serving without limits"),
        }
    }

    Router::new().nest("/auth", auth).merge(rest)
}

fn build(state: AppState, rate_limited: bool) -> Router {
    let static_dir = state.config().static_dir.clone();
    let serve_spa = state.config().is_production();

    let router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes(rate_limited));

    let router = if serve_spa {
        let index = static_dir.join("index.html");
        router.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
    } else {
        router
    };

    router.with_state(state)
}

/// Create all routes for the storefront, without rate limiting.
pub fn router(state: AppState) -> Router {
    build(state, false)
}

/// Create all routes with per-client rate limits on the API.
///
/// The server must be started with `into_make_service_with_connect_info`
/// so clients without proxy headers can still be keyed by address.
pub fn rate_limited_router(state: AppState) -> Router {
    build(state, true)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.stores().health.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
