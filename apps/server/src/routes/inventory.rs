//! Inventory handlers: stock listings and manual adjustments.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use khata_core::InventoryLevel;
use khata_db::StockRow;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    /// Signed stock change: positive restocks, negative corrects downward.
    pub delta: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Path(shop_id): Path<String>,
) -> Result<Json<Vec<StockRow>>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    Ok(Json(state.db.inventory().list(&shop_id).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path((shop_id, product_id)): Path<(String, String)>,
) -> Result<Json<InventoryLevel>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let level = state
        .db
        .inventory()
        .get(&shop_id, &product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "Inventory".to_string(),
            id: product_id,
        })?;
    Ok(Json(level))
}

pub async fn adjust(
    State(state): State<AppState>,
    Path((shop_id, product_id)): Path<(String, String)>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<InventoryLevel>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let level = state
        .db
        .inventory()
        .adjust(&shop_id, &product_id, req.delta)
        .await?;
    Ok(Json(level))
}
