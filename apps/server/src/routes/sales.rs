//! Sale handlers.
//!
//! These are thin wrappers: the transactional work (stock, invoice numbers,
//! balances) lives in `khata_db::SaleRepository`. Handlers only validate
//! shape and quantities.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use khata_core::validation::{validate_amount_cents, validate_quantity};
use khata_core::{PaymentMethod, Sale};
use khata_db::{NewSale, NewSaleItem, SaleWithItems, UpdateSale};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub customer_id: Option<String>,
    pub items: Vec<SaleItemRequest>,
    pub paid_cents: i64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaleRequest {
    pub items: Vec<SaleItemRequest>,
    pub paid_cents: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount_cents: i64,
}

fn into_items(items: Vec<SaleItemRequest>) -> Result<Vec<NewSaleItem>, ApiError> {
    items
        .into_iter()
        .map(|item| {
            validate_quantity(item.quantity)?;
            Ok(NewSaleItem {
                product_id: item.product_id,
                quantity: item.quantity,
            })
        })
        .collect()
}

pub async fn create(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleWithItems>), ApiError> {
    let items = into_items(req.items)?;

    let sale = state
        .db
        .sales()
        .create_sale(
            &shop_id,
            NewSale {
                customer_id: req.customer_id,
                items,
                paid_cents: req.paid_cents,
                payment_method: req.payment_method,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> Result<Json<Vec<SaleWithItems>>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    Ok(Json(state.db.sales().list(&shop_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<Json<SaleWithItems>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let sale = state
        .db
        .sales()
        .get(&shop_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Sale".to_string(),
            id,
        })?;
    Ok(Json(sale))
}

pub async fn update(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateSaleRequest>,
) -> Result<Json<SaleWithItems>, ApiError> {
    let items = into_items(req.items)?;
    state.db.shops().require(&shop_id).await?;

    let sale = state
        .db
        .sales()
        .update_sale(
            &shop_id,
            &id,
            UpdateSale {
                items,
                paid_cents: req.paid_cents,
                payment_method: req.payment_method,
            },
        )
        .await?;
    Ok(Json(sale))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.db.shops().require(&shop_id).await?;
    state.db.sales().delete_sale(&shop_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_payment(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<Sale>, ApiError> {
    validate_amount_cents("amountCents", req.amount_cents)?;

    state.db.shops().require(&shop_id).await?;
    let sale = state
        .db
        .sales()
        .record_payment(&shop_id, &id, req.amount_cents)
        .await?;
    Ok(Json(sale))
}
