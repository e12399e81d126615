//! Server-side cart for the authenticated user.
//!
//! Every operation loads the stored cart, applies one mutation through
//! [`mercato_core::Cart`], and writes the result back with a single store
//! call. Totals are never stored; they come out of the core recompute.

use thiserror::Error;

use mercato_core::{Cart, MAX_QUANTITY, ProductId, UserId};

use crate::db::{CartStore, CouponStore, ProductStore, RepositoryError};
use crate::services::coupons::{CouponError, CouponService};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product does not exist in the catalogue.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The product exists but is not in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),

    /// The requested quantity is larger than a line may hold.
    #[error("quantity cannot exceed {MAX_QUANTITY}")]
    InvalidQuantity(u32),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<mercato_core::CartError> for CartError {
    fn from(err: mercato_core::CartError) -> Self {
        match err {
            mercato_core::CartError::ItemNotFound(id) => Self::ItemNotFound(id),
            mercato_core::CartError::InvalidQuantity(quantity) => Self::InvalidQuantity(quantity),
        }
    }
}

/// Cart operations for one request.
pub struct CartService<'a> {
    carts: &'a dyn CartStore,
    products: &'a dyn ProductStore,
    coupons: CouponService<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(
        carts: &'a dyn CartStore,
        products: &'a dyn ProductStore,
        coupons: &'a dyn CouponStore,
    ) -> Self {
        Self {
            carts,
            products,
            coupons: CouponService::new(coupons),
        }
    }

    /// The user's cart.
    ///
    /// An applied coupon that no longer validates is dropped and the cart
    /// saved without it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if loading or saving fails.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, CartError> {
        let stored = self.carts.load(user_id).await?;
        let mut cart = Cart::from_parts(stored.items, stored.coupon);

        let Some(code) = cart.coupon().map(|c| c.code.clone()) else {
            return Ok(cart);
        };
        match self.coupons.validate(user_id, &code).await {
            Ok(_) => Ok(cart),
            Err(CouponError::NotFound | CouponError::Expired) => {
                tracing::debug!(%user_id, "Dropping stale coupon from cart");
                cart.remove_coupon();
                self.carts.save(user_id, &cart).await?;
                Ok(cart)
            }
            Err(other) => Err(other.into()),
        }
    }

    /// Add one unit of a product at its current price.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for an unknown product.
    pub async fn add_item(&self, user_id: UserId, product_id: ProductId) -> Result<Cart, CartError> {
        let product = self
            .products
            .find_by_id(product_id)
            .await?
            .ok_or(CartError::ProductNotFound(product_id))?;

        let mut cart = self.get(user_id).await?;
        cart.add_item(product.id, product.price);
        self.carts.save(user_id, &cart).await?;
        Ok(cart)
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` above [`MAX_QUANTITY`] and
    /// `CartError::ItemNotFound` if the product is not in the cart.
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart, CartError> {
        if quantity > MAX_QUANTITY {
            return Err(CartError::InvalidQuantity(quantity));
        }
        let mut cart = self.get(user_id).await?;
        cart.update_quantity(product_id, quantity)?;
        self.carts.save(user_id, &cart).await?;
        Ok(cart)
    }

    /// Remove a product's line. Removing an absent product changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if loading or saving fails.
    pub async fn remove_item(&self, user_id: UserId, product_id: ProductId) -> Result<Cart, CartError> {
        let mut cart = self.get(user_id).await?;
        if cart.remove_item(product_id) {
            self.carts.save(user_id, &cart).await?;
        }
        Ok(cart)
    }

    /// Empty the cart, coupon included.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if saving fails.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, CartError> {
        let stored = self.carts.load(user_id).await?;
        let mut cart = Cart::from_parts(stored.items, stored.coupon);
        cart.clear();
        self.carts.save(user_id, &cart).await?;
        Ok(cart)
    }

    /// Validate a coupon code and apply it, replacing any applied coupon.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Coupon` if the code does not validate.
    pub async fn apply_coupon(&self, user_id: UserId, code: &str) -> Result<Cart, CartError> {
        let valid = self.coupons.validate(user_id, code).await?;
        let mut cart = self.get(user_id).await?;
        cart.apply_coupon(valid.into());
        self.carts.save(user_id, &cart).await?;
        Ok(cart)
    }

    /// Remove the applied coupon, if any.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if loading or saving fails.
    pub async fn remove_coupon(&self, user_id: UserId) -> Result<Cart, CartError> {
        let mut cart = self.get(user_id).await?;
        if cart.remove_coupon().is_some() {
            self.carts.save(user_id, &cart).await?;
        }
        Ok(cart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use mercato_core::DiscountPercent;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewCoupon, NewProduct};

    async fn product(store: &MemoryStore, price: i64) -> ProductId {
        ProductStore::create(
            store,
            NewProduct {
                name: format!("Item {price}"),
                description: "A thing".to_owned(),
                price: Decimal::from(price),
                image: "https://img.example.com/p.png".to_owned(),
                category: "things".to_owned(),
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn coupon(store: &MemoryStore, user: UserId, code: &str, expires_in: TimeDelta) {
        CouponService::new(store)
            .issue(NewCoupon {
                code: code.to_owned(),
                user_id: user,
                discount_percentage: DiscountPercent::new(20).unwrap(),
                expiration_date: Utc::now() + expires_in,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_twenty_five_becomes_twenty_with_coupon() {
        let store = MemoryStore::new();
        let service = CartService::new(&store, &store, &store);
        let user = UserId::new(100);
        let ten = product(&store, 10).await;
        let five = product(&store, 5).await;

        service.add_item(user, ten).await.unwrap();
        service.add_item(user, ten).await.unwrap();
        let cart = service.add_item(user, five).await.unwrap();
        assert_eq!(cart.totals().subtotal, Decimal::from(25));
        assert_eq!(cart.totals().total, Decimal::from(25));

        coupon(&store, user, "TWENTY", TimeDelta::days(1)).await;
        let cart = service.apply_coupon(user, "TWENTY").await.unwrap();
        assert_eq!(cart.totals().subtotal, Decimal::from(25));
        assert_eq!(cart.totals().total, Decimal::from(20));

        // The coupon persists across reads.
        let reloaded = service.get(user).await.unwrap();
        assert_eq!(reloaded, cart);
    }

    #[tokio::test]
    async fn test_unknown_product_and_missing_line() {
        let store = MemoryStore::new();
        let service = CartService::new(&store, &store, &store);
        let user = UserId::new(100);

        assert!(matches!(
            service.add_item(user, ProductId::new(999)).await,
            Err(CartError::ProductNotFound(_))
        ));

        let id = product(&store, 3).await;
        assert!(matches!(
            service.update_quantity(user, id, 2).await,
            Err(CartError::ItemNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let store = MemoryStore::new();
        let service = CartService::new(&store, &store, &store);
        let user = UserId::new(100);
        let id = product(&store, 4).await;

        service.add_item(user, id).await.unwrap();
        let cart = service.update_quantity(user, id, 3).await.unwrap();
        assert_eq!(cart.totals().subtotal, Decimal::from(12));

        let cart = service.update_quantity(user, id, 0).await.unwrap();
        assert!(cart.is_empty());
        assert!(service.get(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quantity_above_column_range_is_rejected() {
        let store = MemoryStore::new();
        let service = CartService::new(&store, &store, &store);
        let user = UserId::new(100);
        let id = product(&store, 10).await;
        service.add_item(user, id).await.unwrap();

        assert!(matches!(
            service.update_quantity(user, id, 3_000_000_000).await,
            Err(CartError::InvalidQuantity(3_000_000_000))
        ));
        let cart = service.get(user).await.unwrap();
        assert_eq!(cart.item(id).unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_expired_applied_coupon_is_dropped_on_read() {
        let store = MemoryStore::new();
        let service = CartService::new(&store, &store, &store);
        let user = UserId::new(100);
        let id = product(&store, 10).await;
        service.add_item(user, id).await.unwrap();

        coupon(&store, user, "BRIEF", TimeDelta::milliseconds(300)).await;
        let cart = service.apply_coupon(user, "BRIEF").await.unwrap();
        assert_eq!(cart.totals().total, Decimal::from(8));

        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        let cart = service.get(user).await.unwrap();
        assert!(cart.coupon().is_none());
        assert_eq!(cart.totals().total, Decimal::from(10));
    }

    #[tokio::test]
    async fn test_clear_drops_items_and_coupon() {
        let store = MemoryStore::new();
        let service = CartService::new(&store, &store, &store);
        let user = UserId::new(100);
        let id = product(&store, 10).await;
        service.add_item(user, id).await.unwrap();
        coupon(&store, user, "GONE", TimeDelta::days(1)).await;
        service.apply_coupon(user, "GONE").await.unwrap();

        let cart = service.clear(user).await.unwrap();
        assert!(cart.is_empty());
        assert!(cart.coupon().is_none());
        assert_eq!(service.get(user).await.unwrap(), Cart::new());
    }
}
