//! Sales analytics shapes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Order count and revenue over some range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SalesTotals {
    pub sales: i64,
    pub revenue: Decimal,
}

/// Store-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub users: i64,
    pub products: i64,
    pub total_sales: i64,
    pub total_revenue: Decimal,
}

/// One calendar day of sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    /// Serialised as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub sales: i64,
    pub revenue: Decimal,
}
