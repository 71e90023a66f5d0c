//! Monthly report handler.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{Datelike, Utc};
use serde::Deserialize;

use khata_core::validation::validate_period;
use khata_db::MonthlyReport;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ReportQuery {
    /// Month to report on, "YYYY-MM". Defaults to the current month.
    pub period: Option<String>,
}

pub async fn monthly(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<MonthlyReport>, ApiError> {
    let period = match query.period {
        Some(period) => {
            validate_period(&period)?;
            period
        }
        None => {
            let now = Utc::now();
            format!("{:04}-{:02}", now.year(), now.month())
        }
    };

    state.db.shops().require(&shop_id).await?;

    let report = state.db.reports().monthly(&shop_id, &period).await?;
    Ok(Json(report))
}
