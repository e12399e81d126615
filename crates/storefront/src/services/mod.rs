//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `tokens` - Access/refresh token issuing, verification, and revocation
//! - `guard` - Request authentication and the admin role check
//! - `auth` - Signup, login, logout, and token refresh
//! - `coupons` - Coupon lookup, validation, and issuing
//! - `cart` - Server-side cart backed by the core pricing engine
//! - `products` - Catalogue with a cache-aside featured list
//! - `analytics` - Sales summary and daily series
//!
//! Services borrow their stores for the length of one request; the long-lived
//! pieces (stores, cache, [`tokens::TokenService`]) live in
//! [`crate::state::AppState`].

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod guard;
pub mod products;
pub mod tokens;

pub use analytics::{AnalyticsError, AnalyticsService};
pub use auth::{AuthError, AuthService};
pub use cart::{CartError, CartService};
pub use coupons::{CouponError, CouponService};
pub use guard::{AccessGuard, GuardError, require_admin};
pub use products::{ProductError, ProductService};
pub use tokens::{TokenError, TokenPair, TokenService};
