//! Persistence for the storefront.
//!
//! # Database: `storefront` schema
//!
//! ## Tables
//!
//! - `user` - Accounts with Argon2 password hashes and roles
//! - `product` - Catalogue, including the featured flag
//! - `coupon` - Per-user discount codes (one active per user)
//! - `cart_item` / `cart_coupon` - Server-side carts
//! - `order` - Completed orders, read by analytics
//!
//! Each table is reached through an object-safe store trait so services never
//! name a backend. [`PgStore`] implements them over `PostgreSQL`;
//! [`memory::MemoryStore`] implements them in process for tests and local
//! development.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p mercato-cli -- migrate
//! ```

mod carts;
mod coupons;
pub mod memory;
mod orders;
mod products;
mod users;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use mercato_core::{AppliedCoupon, Cart, CouponId, Email, LineItem, ProductId, UserId, UserRole};

use crate::models::{
    Coupon, DailySales, NewCoupon, NewProduct, NewUser, Product, SalesTotals, User,
    UserCredentials,
};

pub use memory::MemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
fn conflict_or_database(err: sqlx::Error, what: &str) -> RepositoryError {
    match err {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            RepositoryError::Conflict(what.to_owned())
        }
        other => RepositoryError::Database(other),
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Account storage.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up an account and its password hash by normalised email.
    async fn find_credentials(&self, email: &Email)
    -> Result<Option<UserCredentials>, RepositoryError>;

    /// Look up an account by ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Insert a new account.
    ///
    /// Returns [`RepositoryError::Conflict`] if the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Change an account's role.
    ///
    /// Returns [`RepositoryError::NotFound`] for an unknown account.
    async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// Catalogue storage.
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn list_featured(&self) -> Result<Vec<Product>, RepositoryError>;

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError>;

    /// Up to `limit` products in random order.
    async fn sample(&self, limit: usize) -> Result<Vec<Product>, RepositoryError>;

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError>;

    /// Flip the featured flag, returning the updated product if it exists.
    async fn toggle_featured(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Delete a product. Returns whether a row was removed.
    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError>;

    async fn count(&self) -> Result<i64, RepositoryError>;
}

/// Coupon storage.
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// The user's active coupon, if any.
    async fn find_active_for_user(&self, user_id: UserId)
    -> Result<Option<Coupon>, RepositoryError>;

    /// An active coupon matching both code and owner.
    async fn find_active_by_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError>;

    /// Mark a coupon inactive. Inactive coupons are never reactivated.
    async fn deactivate(&self, id: CouponId) -> Result<(), RepositoryError>;

    /// Insert a coupon.
    ///
    /// Returns [`RepositoryError::Conflict`] if the code is taken or the user
    /// already holds an active coupon.
    async fn create(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError>;
}

/// Persisted cart contents for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCart {
    pub items: Vec<LineItem>,
    pub coupon: Option<AppliedCoupon>,
}

/// Cart storage.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn load(&self, user_id: UserId) -> Result<StoredCart, RepositoryError>;

    /// Replace the user's stored cart with `cart` in one operation.
    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError>;
}

/// Order reads for analytics.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Count and revenue across every order.
    async fn totals(&self) -> Result<SalesTotals, RepositoryError>;

    /// Per-day sales between `start` and `end` inclusive.
    ///
    /// Days without orders are omitted; callers fill the gaps.
    async fn daily_sales(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailySales>, RepositoryError>;
}

/// Backend liveness probe used by the readiness endpoint.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The set of stores handed to services.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub coupons: Arc<dyn CouponStore>,
    pub carts: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            users: store.clone(),
            products: store.clone(),
            coupons: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
            health: store,
        }
    }

    /// Stores backed by a fresh in-process [`MemoryStore`].
    #[must_use]
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Stores sharing an existing [`MemoryStore`], so tests can seed it directly.
    #[must_use]
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            products: store.clone(),
            coupons: store.clone(),
            carts: store.clone(),
            orders: store.clone(),
            health: store,
        }
    }
}

/// `PostgreSQL` implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
