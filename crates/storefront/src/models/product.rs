//! Catalogue products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use mercato_core::ProductId;

/// A product in the catalogue.
///
/// Serialisable both as an API response and as the cached featured list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    /// Hosted image URL.
    pub image: String,
    pub category: String,
    pub is_featured: bool,
}

/// Largest storable price, the limit of a `NUMERIC(12, 2)` column.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Fields for creating a product. Products start unfeatured.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
}
