//! Admin analytics route handler.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{AnalyticsSummary, DailySales};
use crate::state::AppState;

/// Dashboard payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub analytics_data: AnalyticsSummary,
    pub daily_sales_data: Vec<DailySales>,
}

/// Store summary and the last week of daily sales.
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<AnalyticsResponse>> {
    let service = state.analytics();
    let analytics_data = service.summary().await?;
    let daily_sales_data = service.daily_sales(Utc::now()).await?;

    Ok(Json(AnalyticsResponse {
        analytics_data,
        daily_sales_data,
    }))
}
