//! Chat history handlers. Storage only; no model calls happen here.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use khata_core::{ChatMessage, ChatRole};

use crate::error::ApiError;
use crate::state::AppState;

/// History page size bounds.
const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub removed: u64,
}

pub async fn append(
    State(state): State<AppState>,
    Path((shop_id, user_id)): Path<(String, String)>,
    Json(req): Json<AppendMessageRequest>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    if req.content.trim().is_empty() {
        return Err(khata_core::ValidationError::Required {
            field: "content".to_string(),
        }
        .into());
    }
    state.db.shops().require(&shop_id).await?;

    let message = state
        .db
        .chat()
        .append(&shop_id, &user_id, req.role, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn history(
    State(state): State<AppState>,
    Path((shop_id, user_id)): Path<(String, String)>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    state.db.shops().require(&shop_id).await?;
    let messages = state.db.chat().history(&shop_id, &user_id, limit).await?;
    Ok(Json(messages))
}

pub async fn clear(
    State(state): State<AppState>,
    Path((shop_id, user_id)): Path<(String, String)>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.db.shops().require(&shop_id).await?;
    let removed = state.db.chat().clear(&shop_id, &user_id).await?;
    Ok(Json(ClearResponse { removed }))
}
