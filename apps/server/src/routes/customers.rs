//! Customer handlers, including khata settlements.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use khata_core::validation::{validate_amount_cents, validate_name};
use khata_core::Customer;
use khata_db::CustomerUpdate;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    pub amount_cents: i64,
}

pub async fn create(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    validate_name("name", &req.name)?;
    state.db.shops().require(&shop_id).await?;

    let customer = state
        .db
        .customers()
        .create(&shop_id, &req.name, req.phone.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    Ok(Json(state.db.customers().list(&shop_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<Json<Customer>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let customer = state
        .db
        .customers()
        .get(&shop_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Customer".to_string(),
            id,
        })?;
    Ok(Json(customer))
}

pub async fn update(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<Json<Customer>, ApiError> {
    if let Some(name) = &req.name {
        validate_name("name", name)?;
    }

    state.db.shops().require(&shop_id).await?;
    let customer = state
        .db
        .customers()
        .update(
            &shop_id,
            &id,
            CustomerUpdate {
                name: req.name,
                phone: req.phone,
            },
        )
        .await?;
    Ok(Json(customer))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.db.shops().require(&shop_id).await?;
    state.db.customers().soft_delete(&shop_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Records a khata repayment against the customer's outstanding balance.
pub async fn settle(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<Customer>, ApiError> {
    validate_amount_cents("amountCents", req.amount_cents)?;

    state.db.shops().require(&shop_id).await?;
    let customer = state
        .db
        .customers()
        .settle_balance(&shop_id, &id, req.amount_cents)
        .await?;
    Ok(Json(customer))
}
