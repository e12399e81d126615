//! Coupon queries.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use mercato_core::{CouponId, DiscountPercent, UserId};

use super::{CouponStore, PgStore, RepositoryError, conflict_or_database};
use crate::models::{Coupon, NewCoupon};

const COUPON_COLUMNS: &str = "id, code, user_id, discount_percentage, expiration_date, is_active";

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: CouponId,
    code: String,
    user_id: UserId,
    discount_percentage: i32,
    expiration_date: DateTime<Utc>,
    is_active: bool,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = RepositoryError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let discount_percentage =
            DiscountPercent::new(i64::from(row.discount_percentage)).map_err(|e| {
                RepositoryError::DataCorruption(format!("coupon {}: {e}", row.id))
            })?;

        Ok(Self {
            id: row.id,
            code: row.code,
            user_id: row.user_id,
            discount_percentage,
            expiration_date: row.expiration_date,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl CouponStore for PgStore {
    async fn find_active_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM storefront.coupon
             WHERE user_id = $1 AND is_active"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    async fn find_active_by_code(
        &self,
        user_id: UserId,
        code: &str,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM storefront.coupon
             WHERE code = $1 AND user_id = $2 AND is_active"
        ))
        .bind(code)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Coupon::try_from).transpose()
    }

    async fn deactivate(&self, id: CouponId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE storefront.coupon SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create(&self, coupon: NewCoupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "INSERT INTO storefront.coupon (code, user_id, discount_percentage, expiration_date)
             VALUES ($1, $2, $3, $4)
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(&coupon.code)
        .bind(coupon.user_id)
        .bind(i32::from(coupon.discount_percentage.value()))
        .bind(coupon.expiration_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "coupon code or active coupon already exists"))?;

        row.try_into()
    }
}
