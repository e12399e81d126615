//! Coupon lookup, validation, and issuing.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use mercato_core::UserId;

use crate::db::{CouponStore, RepositoryError};
use crate::models::{Coupon, NewCoupon, ValidCoupon};

/// Errors from coupon operations.
#[derive(Debug, Error)]
pub enum CouponError {
    /// No active coupon with that code belongs to the user.
    #[error("coupon not found")]
    NotFound,

    /// The coupon existed but its expiry has passed; it is now inactive.
    #[error("coupon expired")]
    Expired,

    /// The code was blank.
    #[error("coupon code is required")]
    MissingCode,

    /// The user already holds an active coupon.
    #[error("user already has an active coupon")]
    AlreadyIssued,

    /// Another coupon already uses this code.
    #[error("coupon code already in use")]
    CodeTaken,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Coupon operations for one request.
pub struct CouponService<'a> {
    coupons: &'a dyn CouponStore,
}

impl<'a> CouponService<'a> {
    #[must_use]
    pub const fn new(coupons: &'a dyn CouponStore) -> Self {
        Self { coupons }
    }

    /// The user's active coupon. Having none is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Repository` if the lookup fails.
    pub async fn get_active(&self, user_id: UserId) -> Result<Option<Coupon>, CouponError> {
        Ok(self.coupons.find_active_for_user(user_id).await?)
    }

    /// Check that `code` is an active, unexpired coupon owned by `user_id`.
    ///
    /// # Errors
    ///
    /// See [`Self::validate_at`].
    pub async fn validate(&self, user_id: UserId, code: &str) -> Result<ValidCoupon, CouponError> {
        self.validate_at(user_id, code, Utc::now()).await
    }

    /// Validate as of `now`. An expired coupon is deactivated before failing.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::NotFound` if no active coupon matches, and
    /// `CouponError::Expired` if it matched but has expired.
    pub async fn validate_at(
        &self,
        user_id: UserId,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ValidCoupon, CouponError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CouponError::MissingCode);
        }

        let coupon = self
            .coupons
            .find_active_by_code(user_id, code)
            .await?
            .ok_or(CouponError::NotFound)?;

        if coupon.is_expired_at(now) {
            self.coupons.deactivate(coupon.id).await?;
            info!(coupon_id = %coupon.id, %user_id, "Coupon expired and deactivated");
            return Err(CouponError::Expired);
        }

        Ok(ValidCoupon {
            code: coupon.code,
            discount_percentage: coupon.discount_percentage,
        })
    }

    /// Issue a coupon to a user who has no active one.
    ///
    /// Surrounding whitespace is stripped from the code, matching how
    /// [`Self::validate_at`] reads codes back.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::AlreadyIssued` if the user already holds an
    /// active coupon and `CouponError::CodeTaken` if the code is in use.
    pub async fn issue(&self, coupon: NewCoupon) -> Result<Coupon, CouponError> {
        let code = coupon.code.trim();
        if code.is_empty() {
            return Err(CouponError::MissingCode);
        }
        let coupon = NewCoupon {
            code: code.to_owned(),
            ..coupon
        };

        let user_id = coupon.user_id;
        if self.coupons.find_active_for_user(user_id).await?.is_some() {
            return Err(CouponError::AlreadyIssued);
        }

        match self.coupons.create(coupon).await {
            Ok(created) => {
                info!(coupon_id = %created.id, %user_id, "Coupon issued");
                Ok(created)
            }
            // The store rejects both a duplicate code and a second active
            // coupon; tell them apart by looking again.
            Err(RepositoryError::Conflict(_)) => {
                if self.coupons.find_active_for_user(user_id).await?.is_some() {
                    Err(CouponError::AlreadyIssued)
                } else {
                    Err(CouponError::CodeTaken)
                }
            }
            Err(other) => Err(other.into()),
        }
    }
}
