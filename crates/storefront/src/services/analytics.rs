//! Sales analytics for the admin dashboard.

use std::collections::HashMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db::{OrderStore, ProductStore, RepositoryError, UserStore};
use crate::models::{AnalyticsSummary, DailySales};

/// Days covered by the daily sales series, not counting today.
pub const DAILY_SALES_WINDOW_DAYS: u64 = 7;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Analytics queries for one request.
pub struct AnalyticsService<'a> {
    users: &'a dyn UserStore,
    products: &'a dyn ProductStore,
    orders: &'a dyn OrderStore,
}

impl<'a> AnalyticsService<'a> {
    #[must_use]
    pub const fn new(
        users: &'a dyn UserStore,
        products: &'a dyn ProductStore,
        orders: &'a dyn OrderStore,
    ) -> Self {
        Self {
            users,
            products,
            orders,
        }
    }

    /// Store-wide counts and revenue.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Repository` if any count fails.
    pub async fn summary(&self) -> Result<AnalyticsSummary, AnalyticsError> {
        let users = self.users.count().await?;
        let products = self.products.count().await?;
        let totals = self.orders.totals().await?;

        Ok(AnalyticsSummary {
            users,
            products,
            total_sales: totals.sales,
            total_revenue: totals.revenue,
        })
    }

    /// One entry per day from `now - 7 days` through `now`, inclusive.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Repository` if the query fails.
    pub async fn daily_sales(&self, now: DateTime<Utc>) -> Result<Vec<DailySales>, AnalyticsError> {
        let start = now
            .checked_sub_days(Days::new(DAILY_SALES_WINDOW_DAYS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let rows = self.orders.daily_sales(start, now).await?;
        Ok(fill_daily_sales(start.date_naive(), now.date_naive(), &rows))
    }
}

/// Expand sparse per-day rows into a contiguous series from `start` to `end`.
///
/// Days with no row get zero sales and zero revenue.
#[must_use]
pub fn fill_daily_sales(start: NaiveDate, end: NaiveDate, rows: &[DailySales]) -> Vec<DailySales> {
    let by_date: HashMap<NaiveDate, &DailySales> = rows.iter().map(|r| (r.date, r)).collect();

    start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| match by_date.get(&date) {
            Some(row) => DailySales {
                date,
                sales: row.sales,
                revenue: row.revenue,
            },
            None => DailySales {
                date,
                sales: 0,
                revenue: Decimal::ZERO,
            },
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use mercato_core::UserId;

    use super::*;
    use crate::db::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_fill_covers_every_day() {
        let rows = vec![DailySales {
            date: date(2024, 3, 3),
            sales: 2,
            revenue: Decimal::from(40),
        }];
        let series = fill_daily_sales(date(2024, 3, 1), date(2024, 3, 8), &rows);

        assert_eq!(series.len(), 8);
        assert_eq!(series.first().unwrap().date, date(2024, 3, 1));
        assert_eq!(series.last().unwrap().date, date(2024, 3, 8));
        assert_eq!(series[2].sales, 2);
        assert_eq!(series[2].revenue, Decimal::from(40));
        assert!(
            series
                .iter()
                .filter(|d| d.date != date(2024, 3, 3))
                .all(|d| d.sales == 0 && d.revenue == Decimal::ZERO)
        );
    }

    #[test]
    fn test_fill_keeps_explicit_zero_rows() {
        let rows = vec![DailySales {
            date: date(2024, 3, 1),
            sales: 0,
            revenue: Decimal::ZERO,
        }];
        let series = fill_daily_sales(date(2024, 3, 1), date(2024, 3, 1), &rows);
        assert_eq!(series, rows);
    }

    #[tokio::test]
    async fn test_summary_with_no_orders_is_zero() {
        let store = MemoryStore::new();
        let service = AnalyticsService::new(&store, &store, &store);
        let summary = service.summary().await.unwrap();
        assert_eq!(summary.total_sales, 0);
        assert_eq!(summary.total_revenue, Decimal::ZERO);
        assert_eq!(summary.users, 0);
    }

    #[tokio::test]
    async fn test_daily_sales_window_has_eight_days() {
        let store = MemoryStore::new();
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        store.insert_order(UserId::new(1), Decimal::from(30), now);
        store.insert_order(
            UserId::new(1),
            Decimal::from(12),
            Utc.with_ymd_and_hms(2024, 5, 4, 9, 0, 0).unwrap(),
        );
        // Outside the window.
        store.insert_order(
            UserId::new(1),
            Decimal::from(99),
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        );

        let service = AnalyticsService::new(&store, &store, &store);
        let series = service.daily_sales(now).await.unwrap();

        assert_eq!(series.len(), 8);
        assert_eq!(series[0].date, date(2024, 5, 3));
        assert_eq!(series[7].date, date(2024, 5, 10));
        assert_eq!(series[1].revenue, Decimal::from(12));
        assert_eq!(series[7].revenue, Decimal::from(30));
        assert_eq!(series.iter().map(|d| d.sales).sum::<i64>(), 2);
    }
}
