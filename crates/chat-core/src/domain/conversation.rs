//! Conversation domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, ModelId};
use crate::error::ChatError;

/// A durable grouping of turns between one user and one bound model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub user_id: String,
    pub model_id: ModelId,
    pub title: String,

    // Audit fields
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`crate::repositories::ConversationStore::create_conversation`].
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub user_id: String,
    pub model_id: ModelId,
    pub title: String,
    pub username: String,
}

impl NewConversation {
    pub fn new(
        user_id: impl Into<String>,
        model_id: ModelId,
        title: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            model_id,
            title: title.into(),
            username: username.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ChatError> {
        if self.user_id.trim().is_empty() {
            return Err(ChatError::InvalidRequest("user_id is required".into()));
        }
        if self.title.trim().is_empty() {
            return Err(ChatError::InvalidRequest("title is required".into()));
        }
        if self.title.chars().count() > 200 {
            return Err(ChatError::InvalidRequest("title exceeds 200 characters".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_title() {
        let input = NewConversation::new("u-1", 7, "   ", "alice");
        assert!(matches!(input.validate(), Err(ChatError::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_rejects_long_title() {
        let input = NewConversation::new("u-1", 7, "x".repeat(201), "alice");
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_regular_input() {
        let input = NewConversation::new("u-1", 7, "Quarterly report", "alice");
        assert!(input.validate().is_ok());
    }
}
