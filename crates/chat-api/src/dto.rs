//! Request/response DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use chat_core::domain::{ModelConfig, ModelId};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateConversationRequest {
    #[validate(length(min = 1, max = 64, message = "user_id must be between 1 and 64 characters"))]
    pub user_id: String,
    pub model_id: ModelId,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, message = "Message content is required"))]
    pub content: String,
    /// Logged when it differs from the conversation's bound model.
    #[serde(default)]
    pub model_id: Option<ModelId>,
    /// Accepted for compatibility; sampling comes from the model configuration.
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// `status`: 1 = active, 0 = inactive, absent = all.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<i32>,
}

impl StatusQuery {
    pub fn active(&self) -> Option<bool> {
        self.status.map(|s| s != 0)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListConversationsQuery {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}

/// Model as shown to clients. Endpoint and credentials stay server-side.
#[derive(Debug, Serialize)]
pub struct ModelDto {
    pub id: ModelId,
    pub name: String,
    pub display_name: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
    pub do_sample: bool,
    pub max_chat_limit: u32,
    pub active: bool,
    pub is_local: bool,
}

impl From<ModelConfig> for ModelDto {
    fn from(model: ModelConfig) -> Self {
        Self {
            id: model.id,
            name: model.name,
            display_name: model.display_name,
            temperature: model.sampling.temperature,
            top_p: model.sampling.top_p,
            max_tokens: model.sampling.max_tokens,
            do_sample: model.sampling.do_sample,
            max_chat_limit: model.max_chat_limit,
            active: model.active,
            is_local: model.is_local,
        }
    }
}
