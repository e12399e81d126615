//! In-process implementation of the store traits.
//!
//! Backs the test suites and `cargo run` without a database. All state sits
//! behind one `std::sync::Mutex`; no method holds the lock across an `.await`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;

use mercato_core::{Cart, CouponId, Email, OrderId, ProductId, UserId, UserRole};

use super::{
    CartStore, CouponStore, HealthCheck, OrderStore, ProductStore, RepositoryError, StoredCart,
    UserStore,
};
use crate::models::{
    Coupon, DailySales, MAX_PRICE, NewCoupon, NewProduct, NewUser, Product, SalesTotals, User,
    UserCredentials,
};

#[derive(Debug, Clone)]
struct OrderRecord {
    total_amount: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    next_id: i64,
    users: BTreeMap<UserId, UserCredentials>,
    products: BTreeMap<ProductId, Product>,
    coupons: BTreeMap<CouponId, Coupon>,
    carts: HashMap<UserId, StoredCart>,
    orders: Vec<OrderRecord>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store that keeps everything in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind, still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a completed order for a user.
    ///
    /// Orders arrive from the payment flow in production; this is how local
    /// runs and tests populate analytics.
    pub fn insert_order(
        &self,
        user_id: UserId,
        total_amount: Decimal,
        created_at: DateTime<Utc>,
    ) -> OrderId {
        let mut state = self.lock();
        let id = OrderId::new(state.next_id());
        tracing::trace!(%id, %user_id, "recording order");
        state.orders.push(OrderRecord {
            total_amount,
            created_at,
        });
        id
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|c| &c.user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.get(&id).map(|c| c.user.clone()))
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut state = self.lock();
        if state.users.values().any(|c| c.user.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(state.next_id()),
            name: user.name,
            email: user.email,
            role: user.role,
            created_at: Utc::now(),
        };
        state.users.insert(
            created.id,
            UserCredentials {
                user: created.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(created)
    }

    async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let mut state = self.lock();
        let entry = state
            .users
            .values_mut()
            .find(|c| &c.user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        entry.user.role = role;
        Ok(entry.user.clone())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.lock().users.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self.lock().products.values().cloned().collect())
    }

    async fn list_featured(&self) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .lock()
            .products
            .values()
            .filter(|p| p.is_featured)
            .cloned()
            .collect())
    }

    async fn list_by_category(&self, category: &str) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .lock()
            .products
            .values()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn sample(&self, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        let mut products: Vec<Product> = self.lock().products.values().cloned().collect();
        products.shuffle(&mut rand::rng());
        products.truncate(limit);
        Ok(products)
    }

    async fn find_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock().products.get(&id).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        if product.price < Decimal::ZERO || product.price > MAX_PRICE {
            return Err(RepositoryError::DataCorruption(format!(
                "price {} out of range",
                product.price
            )));
        }
        let mut state = self.lock();
        let created = Product {
            id: ProductId::new(state.next_id()),
            name: product.name,
            description: product.description,
            price: product.price,
            image: product.image,
            category: product.category,
            is_featured: false,
        };
        state.products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn toggle_featured(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let mut state = self.lock();
        Ok(state.products.get_mut(&id).map(|p| {
            p.is_featured = !p.is_featured;
            p.clone()
        }))
    }

    async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        Ok(self.lock().products.remove(&id).is_some())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(i64::try_from(self.lock().products.len()).unwrap_or(i64::MAX))
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn find_active_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Coupon>, RepositoryError> {
        Ok(self
            .lock()
            .coupons
            .values()
            .find(|c| c.user_id == user_id && c.is_active)
            .cloned())
    }

    async fn find_active_by_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError> {
        Ok(self
            .lock()
            .coupons
            .values()
            .find(|c| c.user_id == user_id && c.code == code && c.is_active)
            .cloned())
    }

    async fn deactivate(&self, id: CouponId) -> Result<(), RepositoryError> {
        if let Some(coupon) = self.lock().coupons.get_mut(&id) {
            coupon.is_active = false;
        }
        Ok(())
    }

    async fn create(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError> {
        let mut state = self.lock();
        let clash = state.coupons.values().any(|c| {
            c.code == coupon.code || (c.user_id == coupon.user_id && c.is_active)
        });
        if clash {
            return Err(RepositoryError::Conflict(
                "coupon code or active coupon already exists".to_owned(),
            ));
        }

        let created = Coupon {
            id: CouponId::new(state.next_id()),
            code: coupon.code,
            user_id: coupon.user_id,
            discount_percentage: coupon.discount_percentage,
            expiration_date: coupon.expiration_date,
            is_active: true,
        };
        state.coupons.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn load(&self, user_id: UserId) -> Result<StoredCart, RepositoryError> {
        Ok(self.lock().carts.get(&user_id).cloned().unwrap_or_default())
    }

    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        if let Some(item) = cart.items().iter().find(|i| i32::try_from(i.quantity).is_err()) {
            return Err(RepositoryError::DataCorruption(format!(
                "quantity out of range for product {}",
                item.product_id
            )));
        }
        let stored = StoredCart {
            items: cart.items().to_vec(),
            coupon: cart.coupon().cloned(),
        };
        self.lock().carts.insert(user_id, stored);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn totals(&self) -> Result<SalesTotals, RepositoryError> {
        let state = self.lock();
        Ok(SalesTotals {
            sales: i64::try_from(state.orders.len()).unwrap_or(i64::MAX),
            revenue: state.orders.iter().map(|o| o.total_amount).sum(),
        })
    }

    async fn daily_sales(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailySales>, RepositoryError> {
        let state = self.lock();
        let mut by_day: BTreeMap<chrono::NaiveDate, SalesTotals> = BTreeMap::new();
        for order in state
            .orders
            .iter()
            .filter(|o| o.created_at >= start && o.created_at <= end)
        {
            let entry = by_day.entry(order.created_at.date_naive()).or_default();
            entry.sales += 1;
            entry.revenue += order.total_amount;
        }

        Ok(by_day
            .into_iter()
            .map(|(date, totals)| DailySales {
                date,
                sales: totals.sales,
                revenue: totals.revenue,
            })
            .collect())
    }
}

#[async_trait]
impl HealthCheck for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
