//! Cart queries.
//!
//! A save replaces the user's rows inside one transaction, so readers never
//! see a half-written cart.

use async_trait::async_trait;
use rust_decimal::Decimal;

use mercato_core::{AppliedCoupon, Cart, DiscountPercent, LineItem, ProductId, UserId};

use super::{CartStore, PgStore, RepositoryError, StoredCart};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    product_id: ProductId,
    unit_price: Decimal,
    quantity: i32,
}

#[derive(sqlx::FromRow)]
struct CartCouponRow {
    code: String,
    discount_percentage: i32,
}

#[async_trait]
impl CartStore for PgStore {
    async fn load(&self, user_id: UserId) -> Result<StoredCart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            r"
            SELECT product_id, unit_price, quantity
            FROM storefront.cart_item
            WHERE user_id = $1
            ORDER BY added_at, product_id
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|row| {
                let quantity = u32::try_from(row.quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "negative quantity for product {}",
                        row.product_id
                    ))
                })?;
                Ok(LineItem {
                    product_id: row.product_id,
                    unit_price: row.unit_price,
                    quantity,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        let coupon = sqlx::query_as::<_, CartCouponRow>(
            "SELECT code, discount_percentage FROM storefront.cart_coupon WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .map(|row| {
            DiscountPercent::new(i64::from(row.discount_percentage))
                .map(|discount_percentage| AppliedCoupon {
                    code: row.code,
                    discount_percentage,
                })
                .map_err(|e| RepositoryError::DataCorruption(format!("cart coupon: {e}")))
        })
        .transpose()?;

        Ok(StoredCart { items, coupon })
    }

    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM storefront.cart_item WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for item in cart.items() {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "quantity out of range for product {}",
                    item.product_id
                ))
            })?;
            sqlx::query(
                r"
                INSERT INTO storefront.cart_item (user_id, product_id, unit_price, quantity)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(user_id)
            .bind(item.product_id)
            .bind(item.unit_price)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM storefront.cart_coupon WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if let Some(coupon) = cart.coupon() {
            sqlx::query(
                r"
                INSERT INTO storefront.cart_coupon (user_id, code, discount_percentage)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(user_id)
            .bind(&coupon.code)
            .bind(i32::from(coupon.discount_percentage.value()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
