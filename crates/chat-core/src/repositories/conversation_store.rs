//! Conversation store trait (port)

use async_trait::async_trait;

use crate::domain::{Conversation, ConversationId, Message, MessageId, ModelId, NewConversation, Turn};
use crate::error::ChatError;

/// Durable record of conversations and messages.
///
/// `append_message` and `complete_message` are separate transactions: an
/// appended message stays visible with no answer until it is completed.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Fails with `ModelUnavailable` unless `model_id` is an active model.
    async fn create_conversation(&self, input: &NewConversation) -> Result<Conversation, ChatError>;

    async fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, ChatError>;

    /// Most recently updated first.
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ChatError>;

    /// Persist the question with a null answer.
    async fn append_message(
        &self,
        conversation_id: ConversationId,
        model_id: ModelId,
        question: &str,
        username: &str,
    ) -> Result<Message, ChatError>;

    /// Set the answer and bump message + conversation timestamps atomically.
    async fn complete_message(
        &self,
        message_id: MessageId,
        answer: &str,
        username: &str,
    ) -> Result<Message, ChatError>;

    /// All messages, oldest first.
    async fn list_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>, ChatError>;

    /// The `limit` most recent answered turns, oldest first.
    async fn recent_turns(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<Turn>, ChatError>;
}
