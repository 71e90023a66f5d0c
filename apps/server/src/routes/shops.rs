//! Shop handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use khata_core::validation::validate_name;
use khata_core::Shop;
use khata_db::ShopUpdate;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopRequest {
    pub name: String,
    pub owner_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopRequest {
    pub name: Option<String>,
    pub owner_name: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateShopRequest>,
) -> Result<(StatusCode, Json<Shop>), ApiError> {
    validate_name("name", &req.name)?;

    let shop = state
        .db
        .shops()
        .create(&req.name, req.owner_name.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(shop)))
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Shop>>, ApiError> {
    Ok(Json(state.db.shops().list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Shop>, ApiError> {
    let shop = state.db.shops().require(&id).await?;
    Ok(Json(shop))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateShopRequest>,
) -> Result<Json<Shop>, ApiError> {
    if let Some(name) = &req.name {
        validate_name("name", name)?;
    }

    let shop = state
        .db
        .shops()
        .update(
            &id,
            ShopUpdate {
                name: req.name,
                owner_name: req.owner_name,
            },
        )
        .await?;
    Ok(Json(shop))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.shops().soft_delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
