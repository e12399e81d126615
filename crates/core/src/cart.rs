//! Cart state and pricing.
//!
//! [`calculate_totals`] is the single place subtotal and total are derived.
//! [`Cart`] never stores totals that could drift: every mutation ends with a
//! full recompute from the current line items and coupon.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DiscountPercent, ProductId};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    ItemNotFound(ProductId),

    /// The requested quantity is above [`MAX_QUANTITY`].
    #[error("quantity {0} exceeds the maximum of {MAX_QUANTITY}")]
    InvalidQuantity(u32),
}

/// Largest quantity a single line may hold. Matches the `INTEGER` column
/// carts are persisted in.
pub const MAX_QUANTITY: u32 = i32::MAX.unsigned_abs();

/// One product entry in a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Unit price captured when the product was first added.
    pub unit_price: Decimal,
    /// Number of units, always at least one.
    pub quantity: u32,
}

impl LineItem {
    /// `unit_price × quantity`, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }
}

/// A validated coupon applied to a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    /// Coupon code as entered.
    pub code: String,
    /// Percentage taken off the subtotal.
    pub discount_percentage: DiscountPercent,
}

/// Derived cart amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of all line totals.
    pub subtotal: Decimal,
    /// Amount removed by the coupon (zero without one).
    pub discount: Decimal,
    /// `subtotal - discount`.
    pub total: Decimal,
}

/// Compute cart totals from line items and an optional coupon.
///
/// Pure: the same inputs always give the same result. No rounding is applied,
/// so `total == subtotal × (1 − pct/100)` holds exactly. Amounts beyond the
/// range of [`Decimal`] saturate instead of panicking.
#[must_use]
pub fn calculate_totals(items: &[LineItem], coupon: Option<&AppliedCoupon>) -> CartTotals {
    let subtotal = items
        .iter()
        .map(LineItem::line_total)
        .fold(Decimal::ZERO, Decimal::saturating_add);

    match coupon {
        None => CartTotals {
            subtotal,
            discount: Decimal::ZERO,
            total: subtotal,
        },
        Some(coupon) => {
            let total = subtotal.saturating_mul(coupon.discount_percentage.retained_fraction());
            CartTotals {
                subtotal,
                discount: subtotal - total,
                total,
            }
        }
    }
}

/// A user's cart: line items, at most one coupon, and the totals derived
/// from them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
    coupon: Option<AppliedCoupon>,
    totals: CartTotals,
}

impl Cart {
    /// An empty cart with no coupon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from persisted state.
    ///
    /// Lines with a zero quantity are dropped rather than kept as empty rows.
    #[must_use]
    pub fn from_parts(items: Vec<LineItem>, coupon: Option<AppliedCoupon>) -> Self {
        let mut cart = Self {
            items: items.into_iter().filter(|item| item.quantity > 0).collect(),
            coupon,
            totals: CartTotals::default(),
        };
        cart.recompute();
        cart
    }

    /// Current line items.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn item(&self, product_id: ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Applied coupon, if any.
    #[must_use]
    pub const fn coupon(&self) -> Option<&AppliedCoupon> {
        self.coupon.as_ref()
    }

    /// Totals for the current state.
    #[must_use]
    pub const fn totals(&self) -> CartTotals {
        self.totals
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |count, item| count.saturating_add(item.quantity))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of a product.
    ///
    /// A product already in the cart keeps its original price snapshot and
    /// gains one unit; a new product is added with quantity one at
    /// `unit_price`. Returns the resulting line.
    pub fn add_item(&mut self, product_id: ProductId, unit_price: Decimal) -> LineItem {
        let line = if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            existing.quantity = existing.quantity.saturating_add(1).min(MAX_QUANTITY);
            existing.clone()
        } else {
            let line = LineItem {
                product_id,
                unit_price,
                quantity: 1,
            };
            self.items.push(line.clone());
            line
        };
        self.recompute();
        line
    }

    /// Remove a product's line entirely.
    ///
    /// Returns whether a line was removed.
    pub fn remove_item(&mut self, product_id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product_id != product_id);
        self.recompute();
        self.items.len() != before
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] above [`MAX_QUANTITY`] and
    /// [`CartError::ItemNotFound`] if the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity > MAX_QUANTITY {
            return Err(CartError::InvalidQuantity(quantity));
        }
        if self.item(product_id).is_none() {
            return Err(CartError::ItemNotFound(product_id));
        }

        if quantity == 0 {
            self.remove_item(product_id);
            return Ok(());
        }

        for item in &mut self.items {
            if item.product_id == product_id {
                item.quantity = quantity;
            }
        }
        self.recompute();
        Ok(())
    }

    /// Apply a coupon, replacing any coupon already applied.
    pub fn apply_coupon(&mut self, coupon: AppliedCoupon) {
        self.coupon = Some(coupon);
        self.recompute();
    }

    /// Remove the applied coupon, returning it.
    pub fn remove_coupon(&mut self) -> Option<AppliedCoupon> {
        let removed = self.coupon.take();
        self.recompute();
        removed
    }

    /// Empty the cart and drop its coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.totals = calculate_totals(&self.items, self.coupon.as_ref());
    }
}
