//! Order aggregates for analytics.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use super::{OrderStore, PgStore, RepositoryError};
use crate::models::{DailySales, SalesTotals};

#[derive(sqlx::FromRow)]
struct TotalsRow {
    sales: i64,
    revenue: Decimal,
}

#[derive(sqlx::FromRow)]
struct DailyRow {
    day: NaiveDate,
    sales: i64,
    revenue: Decimal,
}

#[async_trait]
impl OrderStore for PgStore {
    async fn totals(&self) -> Result<SalesTotals, RepositoryError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r"
            SELECT COUNT(*) AS sales, COALESCE(SUM(total_amount), 0) AS revenue
            FROM storefront.order
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesTotals {
            sales: row.sales,
            revenue: row.revenue,
        })
    }

    async fn daily_sales(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailySales>, RepositoryError> {
        let rows = sqlx::query_as::<_, DailyRow>(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
                   COUNT(*) AS sales,
                   COALESCE(SUM(total_amount), 0) AS revenue
            FROM storefront.order
            WHERE created_at >= $1 AND created_at <= $2
            GROUP BY day
            ORDER BY day
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| DailySales {
                date: row.day,
                sales: row.sales,
                revenue: row.revenue,
            })
            .collect())
    }
}
