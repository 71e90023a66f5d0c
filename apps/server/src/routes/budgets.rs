//! Budget handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use khata_core::validation::{validate_amount_cents, validate_name, validate_period};
use khata_core::Budget;
use khata_db::NewBudget;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBudgetRequest {
    pub category: String,
    pub amount_cents: i64,
    pub period: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBudgetRequest {
    pub amount_cents: i64,
}

#[derive(Debug, Deserialize, Default)]
pub struct BudgetListQuery {
    pub period: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(req): Json<CreateBudgetRequest>,
) -> Result<(StatusCode, Json<Budget>), ApiError> {
    validate_name("category", &req.category)?;
    validate_amount_cents("amountCents", req.amount_cents)?;
    validate_period(&req.period)?;
    state.db.shops().require(&shop_id).await?;

    let budget = state
        .db
        .budgets()
        .create(
            &shop_id,
            NewBudget {
                category: req.category,
                amount_cents: req.amount_cents,
                period: req.period,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Query(query): Query<BudgetListQuery>,
) -> Result<Json<Vec<Budget>>, ApiError> {
    if let Some(period) = &query.period {
        validate_period(period)?;
    }
    state.db.shops().require(&shop_id).await?;

    let budgets = state
        .db
        .budgets()
        .list(&shop_id, query.period.as_deref())
        .await?;
    Ok(Json(budgets))
}

pub async fn get(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<Json<Budget>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let budget = state
        .db
        .budgets()
        .get(&shop_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Budget".to_string(),
            id,
        })?;
    Ok(Json(budget))
}

pub async fn update(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateBudgetRequest>,
) -> Result<Json<Budget>, ApiError> {
    validate_amount_cents("amountCents", req.amount_cents)?;

    state.db.shops().require(&shop_id).await?;
    let budget = state
        .db
        .budgets()
        .update_amount(&shop_id, &id, req.amount_cents)
        .await?;
    Ok(Json(budget))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.db.shops().require(&shop_id).await?;
    state.db.budgets().soft_delete(&shop_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
