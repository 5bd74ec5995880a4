// ============================================================================
// Chat API - Conversation Handlers
// File: crates/chat-api/src/handlers/conversations.rs
// ============================================================================
//! Conversation and message endpoints

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use tracing::debug;
use validator::Validate;

use chat_core::domain::{Conversation, ConversationId, Message, NewConversation};
use chat_core::services::TurnRequest;

use super::username;
use crate::dto::{CreateConversationRequest, ListConversationsQuery, SendMessageRequest};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// POST /api/v1/chat/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateConversationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Conversation>>), ApiError> {
    payload.validate()?;

    let input = NewConversation::new(
        payload.user_id,
        payload.model_id,
        payload.title,
        username(&headers),
    );
    let conversation = state.orchestrator.create_conversation(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(conversation))))
}

/// GET /api/v1/chat/conversations?user_id=
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(query): Query<ListConversationsQuery>,
) -> Result<Json<ApiResponse<Vec<Conversation>>>, ApiError> {
    query.validate()?;
    let conversations = state.orchestrator.list_conversations(&query.user_id).await?;
    Ok(Json(ApiResponse::success(conversations)))
}

/// POST /api/v1/chat/conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
    headers: HeaderMap,
    Json(payload): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<Message>>, ApiError> {
    payload.validate()?;
    if payload.params.is_some() {
        debug!("Ignoring client sampling params for conversation {}", conversation_id);
    }

    let request = TurnRequest::new(conversation_id, payload.content)
        .with_username(username(&headers))
        .with_model_hint(payload.model_id);
    let message = state.orchestrator.submit_turn(request).await?;
    Ok(Json(ApiResponse::success(message)))
}

/// GET /api/v1/chat/conversations/{id}/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state.orchestrator.conversation_messages(conversation_id).await?;
    Ok(Json(ApiResponse::success(messages)))
}
