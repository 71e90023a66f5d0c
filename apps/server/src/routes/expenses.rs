//! Expense handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use khata_core::validation::{validate_amount_cents, validate_name, validate_period};
use khata_core::Expense;
use khata_db::{ExpenseUpdate, NewExpense};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub incurred_on: NaiveDate,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount_cents: Option<i64>,
    pub incurred_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExpenseListQuery {
    /// Optional month filter, "YYYY-MM".
    pub period: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    validate_name("category", &req.category)?;
    validate_amount_cents("amountCents", req.amount_cents)?;
    state.db.shops().require(&shop_id).await?;

    let expense = state
        .db
        .expenses()
        .create(
            &shop_id,
            NewExpense {
                category: req.category,
                description: req.description,
                amount_cents: req.amount_cents,
                incurred_on: req.incurred_on,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Query(query): Query<ExpenseListQuery>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    if let Some(period) = &query.period {
        validate_period(period)?;
    }
    state.db.shops().require(&shop_id).await?;

    let expenses = state
        .db
        .expenses()
        .list(&shop_id, query.period.as_deref())
        .await?;
    Ok(Json(expenses))
}

pub async fn get(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<Json<Expense>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let expense = state
        .db
        .expenses()
        .get(&shop_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Expense".to_string(),
            id,
        })?;
    Ok(Json(expense))
}

pub async fn update(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    if let Some(category) = &req.category {
        validate_name("category", category)?;
    }
    if let Some(amount_cents) = req.amount_cents {
        validate_amount_cents("amountCents", amount_cents)?;
    }

    state.db.shops().require(&shop_id).await?;
    let expense = state
        .db
        .expenses()
        .update(
            &shop_id,
            &id,
            ExpenseUpdate {
                category: req.category,
                description: req.description,
                amount_cents: req.amount_cents,
                incurred_on: req.incurred_on,
            },
        )
        .await?;
    Ok(Json(expense))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.db.shops().require(&shop_id).await?;
    state.db.expenses().soft_delete(&shop_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
