//! Coupon domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mercato_core::{AppliedCoupon, CouponId, DiscountPercent, UserId};

/// A coupon owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub user_id: UserId,
    pub discount_percentage: DiscountPercent,
    pub expiration_date: DateTime<Utc>,
    pub is_active: bool,
}

impl Coupon {
    /// Whether the coupon's expiry lies strictly before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_date < now
    }
}

/// Fields for issuing a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub user_id: UserId,
    pub discount_percentage: DiscountPercent,
    pub expiration_date: DateTime<Utc>,
}

/// Result of a successful validation: the code and its discount.
///
/// Validation does not apply the discount; callers decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidCoupon {
    pub code: String,
    pub discount_percentage: DiscountPercent,
}

impl From<ValidCoupon> for AppliedCoupon {
    fn from(valid: ValidCoupon) -> Self {
        Self {
            code: valid.code,
            discount_percentage: valid.discount_percentage,
        }
    }
}
