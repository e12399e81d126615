//! Key-value cache for refresh tokens and the featured product list.
//!
//! Two backends implement [`KeyValueCache`]:
//! - [`RedisCache`] when `STOREFRONT_REDIS_URL` is set, shared across instances
//! - [`MemoryCache`] otherwise, an in-process `moka` cache
//!
//! Keys are typed through [`CacheKey`] so every entry lives under a known
//! namespace.

mod memory;
mod redis;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use mercato_core::UserId;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

/// Errors from the cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
}

/// Namespaced cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The single valid refresh token for a user.
    RefreshToken(UserId),
    /// JSON list of featured products.
    FeaturedProducts,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RefreshToken(user_id) => write!(f, "refresh_token:{user_id}"),
            Self::FeaturedProducts => f.write_str("product:featured"),
        }
    }
}

/// String-valued cache with optional per-entry expiry.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Read a live entry.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    /// Write an entry, replacing any previous value. `None` keeps it until
    /// invalidated.
    async fn set(
        &self,
        key: &CacheKey,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>;

    /// Remove an entry. Removing a missing key is not an error.
    async fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError>;
}

/// Build the configured cache backend.
///
/// # Errors
///
/// Returns `CacheError::Redis` if a Redis URL is given but the connection
/// cannot be established.
pub async fn connect(redis_url: Option<&SecretString>) -> Result<Arc<dyn KeyValueCache>, CacheError> {
    match redis_url {
        Some(url) => {
            let cache = RedisCache::connect(url.expose_secret()).await?;
            tracing::info!("Using Redis cache");
            Ok(Arc::new(cache))
        }
        None => {
            tracing::info!("STOREFRONT_REDIS_URL not set, using in-process cache");
            Ok(Arc::new(MemoryCache::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_namespaces() {
        assert_eq!(
            CacheKey::RefreshToken(UserId::new(42)).to_string(),
            "refresh_token:42"
        );
        assert_eq!(CacheKey::FeaturedProducts.to_string(), "product:featured");
    }
}
