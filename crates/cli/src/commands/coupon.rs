//! Coupon management commands.

use chrono::{TimeDelta, Utc};
use thiserror::Error;

use mercato_core::{DiscountError, DiscountPercent, Email, EmailError};
use mercato_storefront::db::{RepositoryError, Stores};
use mercato_storefront::models::NewCoupon;
use mercato_storefront::services::{CouponError, CouponService};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum CouponCommandError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Invalid discount: {0}")]
    InvalidDiscount(#[from] DiscountError),

    #[error("No user with email: {0}")]
    UnknownUser(String),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Could not issue coupon: {0}")]
    Coupon(#[from] CouponError),
}

/// Issue a coupon to the user with `email`, expiring `days` from now.
pub async fn issue(
    email: &str,
    code: &str,
    discount: i64,
    days: u32,
) -> Result<(), CouponCommandError> {
    let email = Email::parse(email)?;
    let discount_percentage = DiscountPercent::new(discount)?;
    let stores = Stores::postgres(connect().await?);

    let user = stores
        .users
        .find_credentials(&email)
        .await?
        .ok_or_else(|| CouponCommandError::UnknownUser(email.to_string()))?
        .user;

    let coupon = CouponService::new(stores.coupons.as_ref())
        .issue(NewCoupon {
            code: code.to_owned(),
            user_id: user.id,
            discount_percentage,
            expiration_date: Utc::now() + TimeDelta::days(i64::from(days)),
        })
        .await?;

    tracing::info!(
        coupon_id = %coupon.id,
        code = %coupon.code,
        user_id = %user.id,
        expires = %coupon.expiration_date,
        "Coupon issued"
    );
    Ok(())
}
