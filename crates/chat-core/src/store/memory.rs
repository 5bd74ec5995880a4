use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::domain::{
    new_id, truncate_oldest, Conversation, ConversationId, Message, MessageId, ModelConfig,
    ModelId, NewConversation, ShortcutConfig, Turn,
};
use crate::error::ChatError;
use crate::repositories::{ConversationStore, ModelCatalog};

#[derive(Default)]
struct Tables {
    models: HashMap<ModelId, ModelConfig>,
    shortcuts: Vec<ShortcutConfig>,
    conversations: HashMap<ConversationId, Conversation>,
    /// Insertion order doubles as the creation-time tie breaker.
    messages: Vec<Message>,
}

/// Conversation store and model catalog kept in process memory.
///
/// Every operation takes the table lock once, so each call behaves like a
/// single transaction.
pub struct InMemoryConversationStore {
    tables: RwLock<Tables>,
    clock: Arc<dyn Clock>,
    fail_writes: AtomicBool,
    history_reads: AtomicUsize,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            clock,
            fail_writes: AtomicBool::new(false),
            history_reads: AtomicUsize::new(0),
        }
    }

    pub fn insert_model(&self, model: ModelConfig) {
        self.tables.write().models.insert(model.id, model);
    }

    pub fn insert_shortcut(&self, shortcut: ShortcutConfig) {
        self.tables.write().shortcuts.push(shortcut);
    }

    pub fn set_model_active(&self, id: ModelId, active: bool) {
        if let Some(model) = self.tables.write().models.get_mut(&id) {
            model.active = active;
        }
    }

    pub fn set_chat_limit(&self, id: ModelId, limit: u32) {
        if let Some(model) = self.tables.write().models.get_mut(&id) {
            model.max_chat_limit = limit;
        }
    }

    /// Make every subsequent write fail with `StoreFailure`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// How many times history was loaded through `recent_turns`.
    pub fn history_reads(&self) -> usize {
        self.history_reads.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), ChatError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ChatError::store("write rejected by store"));
        }
        Ok(())
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn create_conversation(&self, input: &NewConversation) -> Result<Conversation, ChatError> {
        self.check_writable()?;
        let mut tables = self.tables.write();

        let model_active = tables
            .models
            .get(&input.model_id)
            .map(|m| m.active)
            .unwrap_or(false);
        if !model_active {
            return Err(ChatError::ModelUnavailable(input.model_id));
        }

        let now = self.clock.now();
        let conversation = Conversation {
            id: new_id(),
            user_id: input.user_id.clone(),
            model_id: input.model_id,
            title: input.title.clone(),
            created_by: Some(input.username.clone()),
            updated_by: Some(input.username.clone()),
            created_at: now,
            updated_at: now,
        };
        tables.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, ChatError> {
        Ok(self.tables.read().conversations.get(&id).cloned())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ChatError> {
        let tables = self.tables.read();
        let mut conversations: Vec<Conversation> = tables
            .conversations
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(conversations)
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        model_id: ModelId,
        question: &str,
        username: &str,
    ) -> Result<Message, ChatError> {
        self.check_writable()?;
        let mut tables = self.tables.write();

        if !tables.conversations.contains_key(&conversation_id) {
            return Err(ChatError::ConversationNotFound(conversation_id));
        }

        let now = self.clock.now();
        let message = Message {
            id: new_id(),
            conversation_id,
            model_id,
            question: question.to_string(),
            answer: None,
            created_by: Some(username.to_string()),
            updated_by: Some(username.to_string()),
            created_at: now,
            updated_at: now,
        };
        tables.messages.push(message.clone());
        debug!("Appended message {} to conversation {}", message.id, conversation_id);
        Ok(message)
    }

    async fn complete_message(
        &self,
        message_id: MessageId,
        answer: &str,
        username: &str,
    ) -> Result<Message, ChatError> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let now = self.clock.now();

        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| ChatError::store(format!("message {} not found", message_id)))?;
        if message.answer.is_some() {
            return Err(ChatError::store(format!("message {} already answered", message_id)));
        }
        message.answer = Some(answer.to_string());
        message.updated_at = now;
        message.updated_by = Some(username.to_string());
        let completed = message.clone();

        if let Some(conversation) = tables.conversations.get_mut(&completed.conversation_id) {
            conversation.updated_at = now;
            conversation.updated_by = Some(username.to_string());
        }

        Ok(completed)
    }

    async fn list_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>, ChatError> {
        let tables = self.tables.read();
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(messages)
    }

    async fn recent_turns(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<Turn>, ChatError> {
        self.history_reads.fetch_add(1, Ordering::SeqCst);

        let mut turns: Vec<Turn> = self
            .list_messages(conversation_id)
            .await?
            .iter()
            .filter_map(Message::to_turn)
            .collect();
        truncate_oldest(&mut turns, limit);
        Ok(turns)
    }
}

#[async_trait]
impl ModelCatalog for InMemoryConversationStore {
    async fn find_model(&self, id: ModelId) -> Result<Option<ModelConfig>, ChatError> {
        Ok(self.tables.read().models.get(&id).cloned())
    }

    async fn list_models(&self, active: Option<bool>) -> Result<Vec<ModelConfig>, ChatError> {
        let tables = self.tables.read();
        let mut models: Vec<ModelConfig> = tables
            .models
            .values()
            .filter(|m| active.map_or(true, |a| m.active == a))
            .cloned()
            .collect();
        models.sort_by_key(|m| m.id);
        Ok(models)
    }

    async fn list_shortcuts(&self, active: Option<bool>) -> Result<Vec<ShortcutConfig>, ChatError> {
        Ok(self
            .tables
            .read()
            .shortcuts
            .iter()
            .filter(|s| active.map_or(true, |a| s.active == a))
            .cloned()
            .collect())
    }
}
