//! Application state shared across handlers.

use std::sync::Arc;

use crate::cache::KeyValueCache;
use crate::config::StorefrontConfig;
use crate::db::Stores;
use crate::services::{
    AccessGuard, AnalyticsService, AuthService, CartService, CouponService, ProductService,
    TokenService,
};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like stores, the cache, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    stores: Stores,
    cache: Arc<dyn KeyValueCache>,
    tokens: TokenService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The token service signs with the configured secrets and records
    /// refresh tokens in `cache`.
    #[must_use]
    pub fn new(config: StorefrontConfig, stores: Stores, cache: Arc<dyn KeyValueCache>) -> Self {
        let tokens = TokenService::new(
            &config.access_token_secret,
            &config.refresh_token_secret,
            Arc::clone(&cache),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                stores,
                cache,
                tokens,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the configured stores.
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    /// Get the key-value cache.
    #[must_use]
    pub fn cache(&self) -> &dyn KeyValueCache {
        self.inner.cache.as_ref()
    }

    /// Get the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    #[must_use]
    pub fn guard(&self) -> AccessGuard<'_> {
        AccessGuard::new(self.tokens(), self.stores().users.as_ref())
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.stores().users.as_ref(), self.tokens())
    }

    #[must_use]
    pub fn coupons(&self) -> CouponService<'_> {
        CouponService::new(self.stores().coupons.as_ref())
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        let stores = self.stores();
        CartService::new(
            stores.carts.as_ref(),
            stores.products.as_ref(),
            stores.coupons.as_ref(),
        )
    }

    #[must_use]
    pub fn products(&self) -> ProductService<'_> {
        ProductService::new(
            self.stores().products.as_ref(),
            self.cache(),
            self.config().featured_cache_ttl,
        )
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsService<'_> {
        let stores = self.stores();
        AnalyticsService::new(
            stores.users.as_ref(),
            stores.products.as_ref(),
            stores.orders.as_ref(),
        )
    }
}
