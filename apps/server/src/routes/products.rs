//! Product handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use khata_core::validation::{validate_name, validate_price_cents, validate_sku};
use khata_core::Product;
use khata_db::{NewProduct, ProductUpdate};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
}

pub async fn create(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_name("name", &req.name)?;
    validate_sku(&req.sku)?;
    validate_price_cents(req.price_cents)?;

    // The shop must exist; a typo'd shop ID should 404, not silently create
    state.db.shops().require(&shop_id).await?;

    let product = state
        .db
        .products()
        .create(
            &shop_id,
            NewProduct {
                name: req.name,
                sku: req.sku,
                category: req.category,
                price_cents: req.price_cents,
                cost_cents: req.cost_cents,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    Ok(Json(state.db.products().list(&shop_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<Json<Product>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let product = state
        .db
        .products()
        .get(&shop_id, &id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Product".to_string(),
            id,
        })?;
    Ok(Json(product))
}

pub async fn update(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<Json<Product>, ApiError> {
    if let Some(name) = &req.name {
        validate_name("name", name)?;
    }
    if let Some(price_cents) = req.price_cents {
        validate_price_cents(price_cents)?;
    }

    state.db.shops().require(&shop_id).await?;
    let product = state
        .db
        .products()
        .update(
            &shop_id,
            &id,
            ProductUpdate {
                name: req.name,
                category: req.category,
                price_cents: req.price_cents,
                cost_cents: req.cost_cents,
            },
        )
        .await?;
    Ok(Json(product))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((shop_id, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.db.shops().require(&shop_id).await?;
    state.db.products().soft_delete(&shop_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
