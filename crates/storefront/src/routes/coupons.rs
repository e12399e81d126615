//! Coupon route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::{Coupon, ValidCoupon};
use crate::routes::ApiJson;
use crate::state::AppState;

/// Coupon validation request body.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: Option<String>,
}

/// The user's active coupon, or `null`.
pub async fn active(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Option<Coupon>>> {
    Ok(Json(state.coupons().get_active(user.id).await?))
}

/// Check a code against the user's coupons.
pub async fn validate(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ValidateRequest>,
) -> Result<Json<ValidCoupon>> {
    let code = body.code.unwrap_or_default();
    Ok(Json(state.coupons().validate(user.id, &code).await?))
}
