//! Product catalogue route handlers.
//!
//! Listing everything and all mutations are admin-only; featured,
//! recommendations, and category listings are public.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};

use mercato_core::ProductId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product};
use crate::routes::ApiJson;
use crate::state::AppState;

/// Product creation request body.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub image: Option<String>,
    pub category: Option<String>,
}

impl TryFrom<CreateProductRequest> for NewProduct {
    type Error = AppError;

    fn try_from(body: CreateProductRequest) -> std::result::Result<Self, Self::Error> {
        let price = body
            .price
            .ok_or_else(|| AppError::BadRequest("Price is required".to_owned()))?;
        Ok(Self {
            name: body.name.unwrap_or_default(),
            description: body.description.unwrap_or_default(),
            price,
            image: body.image.unwrap_or_default(),
            category: body.category.unwrap_or_default(),
        })
    }
}

/// Every product.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().list_all().await?))
}

/// Add a product.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.products().create(body.try_into()?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Featured products.
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().featured().await?))
}

/// A few random products.
pub async fn recommendations(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().recommendations().await?))
}

/// Products in one category.
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.products().by_category(&category).await?))
}

/// Flip a product's featured flag.
pub async fn toggle_featured(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(state.products().toggle_featured(id).await?))
}

/// Remove a product.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    state.products().delete(id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}
