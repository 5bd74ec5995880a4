// ============================================================================
// Chat API - Model Handlers
// File: crates/chat-api/src/handlers/models.rs
// ============================================================================

use axum::{
    extract::{Query, State},
    Json,
};

use chat_core::domain::ShortcutConfig;

use crate::dto::{ModelDto, StatusQuery};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/chat/models
pub async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Vec<ModelDto>>>, ApiError> {
    let models = state
        .orchestrator
        .registry()
        .list_models(query.active())
        .await?;
    Ok(Json(ApiResponse::success(
        models.into_iter().map(ModelDto::from).collect(),
    )))
}

/// GET /api/v1/chat/shortcuts
pub async fn list_shortcuts(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<ApiResponse<Vec<ShortcutConfig>>>, ApiError> {
    let shortcuts = state
        .orchestrator
        .registry()
        .list_shortcuts(query.active())
        .await?;
    Ok(Json(ApiResponse::success(shortcuts)))
}
