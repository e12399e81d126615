//! Cart route handlers.
//!
//! Every handler responds with the full recomputed [`CartView`].

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use serde::Deserialize;

use mercato_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CartView;
use crate::routes::ApiJson;
use crate::state::AppState;

/// Body for adding a product or removing a single line.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub product_id: Option<ProductId>,
}

/// Body for setting a line's quantity.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: Option<u32>,
}

/// Body for applying a coupon.
#[derive(Debug, Deserialize)]
pub struct CouponRequest {
    pub code: Option<String>,
}

/// The user's cart.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = state.cart().get(user.id).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add one unit of a product.
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<Json<CartView>> {
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))?;
    let cart = state.cart().add_item(user.id, product_id).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Set the quantity of a line; zero removes it.
pub async fn update_quantity(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    ApiJson(body): ApiJson<QuantityRequest>,
) -> Result<Json<CartView>> {
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::BadRequest("Quantity is required".to_owned()))?;
    let cart = state
        .cart()
        .update_quantity(user.id, product_id, quantity)
        .await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove one line when a product ID is given, otherwise empty the cart.
///
/// The body is optional, so it is read raw rather than through a JSON
/// extractor that would reject an empty request.
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    body: Bytes,
) -> Result<Json<CartView>> {
    let product_id = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<ProductRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid request body: {e}")))?
            .product_id
    };

    let service = state.cart();
    let cart = match product_id {
        Some(id) => service.remove_item(user.id, id).await?,
        None => service.clear(user.id).await?,
    };
    Ok(Json(CartView::from(&cart)))
}

/// Validate a coupon code and apply it to the cart.
pub async fn apply_coupon(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<CouponRequest>,
) -> Result<Json<CartView>> {
    let code = body.code.unwrap_or_default();
    let cart = state.cart().apply_coupon(user.id, &code).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Remove the applied coupon.
pub async fn remove_coupon(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = state.cart().remove_coupon(user.id).await?;
    Ok(Json(CartView::from(&cart)))
}
