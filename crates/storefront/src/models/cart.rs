//! Cart response shape.

use rust_decimal::Decimal;
use serde::Serialize;

use mercato_core::{AppliedCoupon, Cart, LineItem};

/// The cart as returned by every cart endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub coupon: Option<AppliedCoupon>,
    pub item_count: u32,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let totals = cart.totals();
        Self {
            items: cart.items().to_vec(),
            coupon: cart.coupon().cloned(),
            item_count: cart.item_count(),
            subtotal: totals.subtotal,
            discount: totals.discount,
            total: totals.total,
        }
    }
}
