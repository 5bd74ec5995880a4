//! Domain errors

use thiserror::Error;

use crate::domain::{ConversationId, MessageId, ModelId};

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("Model {0} not found or not active")]
    ModelUnavailable(ModelId),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Model invocation failed for message {message_id}: {reason}")]
    InvocationFailure { message_id: MessageId, reason: String },

    /// `message_id` is absent when the deadline passed before the question was persisted.
    #[error("Turn deadline exceeded")]
    Timeout { message_id: Option<MessageId> },

    #[error("Store failure: {reason}")]
    StoreFailure {
        message_id: Option<MessageId>,
        reason: String,
    },
}

impl ChatError {
    pub fn store(reason: impl Into<String>) -> Self {
        Self::StoreFailure {
            message_id: None,
            reason: reason.into(),
        }
    }

    /// Id of the unanswered message left behind by a failed turn.
    pub fn message_id(&self) -> Option<MessageId> {
        match self {
            Self::InvocationFailure { message_id, .. } => Some(*message_id),
            Self::Timeout { message_id } | Self::StoreFailure { message_id, .. } => *message_id,
            _ => None,
        }
    }

    /// Attach the in-flight message id to a store failure raised after the append.
    pub fn with_message_id(self, id: MessageId) -> Self {
        match self {
            Self::StoreFailure { reason, .. } => Self::StoreFailure {
                message_id: Some(id),
                reason,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_message_id_only_for_post_append_errors() {
        let id = Uuid::new_v4();

        assert_eq!(ChatError::Timeout { message_id: Some(id) }.message_id(), Some(id));
        assert_eq!(ChatError::Timeout { message_id: None }.message_id(), None);
        assert_eq!(
            ChatError::InvocationFailure { message_id: id, reason: "boom".into() }.message_id(),
            Some(id)
        );
        assert_eq!(ChatError::ModelUnavailable(7).message_id(), None);
        assert_eq!(ChatError::store("down").message_id(), None);
        assert_eq!(ChatError::store("down").with_message_id(id).message_id(), Some(id));
    }
}
