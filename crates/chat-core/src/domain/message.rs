//! Message (turn) domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, MessageId, ModelId, Turn};

/// One question/answer exchange within a conversation.
///
/// A `None` answer marks a turn that is in flight or whose invocation failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub model_id: ModelId,
    pub question: String,
    pub answer: Option<String>,

    // Audit fields
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Message {
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    /// The completed turn, or `None` while unanswered.
    pub fn to_turn(&self) -> Option<Turn> {
        self.answer
            .as_ref()
            .map(|answer| Turn::new(self.question.clone(), answer.clone()))
    }
}
