//! Turn orchestrator
//!
//! Per turn: `Created → ModelResolved → HistoryAssembled → Invoking → Completed`,
//! or `Failed` once the model is resolved.
//!
//! - Nothing is written before the model and backend are resolved, or when
//!   the deadline passes while waiting for the conversation lock.
//! - The question is persisted before the backend is called, so a crash
//!   mid-invocation leaves an auditable unanswered row.
//! - On failure the row keeps a null answer, the cache is left untouched and
//!   the error carries the message id.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use chat_shared::constants::{DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_SESSION_TTL_SECS, DEFAULT_USERNAME};

use super::conversation_lock::ConversationLocks;
use super::model_registry::ModelRegistry;
use crate::backend::{BackendError, InvocationRequest};
use crate::cache::{CacheError, SessionCache};
use crate::domain::{
    truncate_oldest, Conversation, ConversationId, Message, ModelId, NewConversation, Turn,
};
use crate::error::ChatError;
use crate::repositories::ConversationStore;

/// Idle lock entries are swept once the table grows past this size.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Session memory TTL, measured from the last write.
    pub session_ttl: Duration,
    /// Invocation deadline used when the caller does not supply one.
    pub default_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            default_timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
        }
    }
}

/// One inbound user message.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub conversation_id: ConversationId,
    pub content: String,
    pub username: String,
    pub deadline: Option<Instant>,
    /// Informational only: the conversation's bound model always answers.
    pub model_hint: Option<ModelId>,
}

impl TurnRequest {
    pub fn new(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self {
            conversation_id,
            content: content.into(),
            username: DEFAULT_USERNAME.to_string(),
            deadline: None,
            model_hint: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_model_hint(mut self, model_id: Option<ModelId>) -> Self {
        self.model_hint = model_id;
        self
    }
}

pub struct ChatOrchestrator {
    registry: Arc<ModelRegistry>,
    store: Arc<dyn ConversationStore>,
    cache: Arc<dyn SessionCache>,
    locks: ConversationLocks,
    config: OrchestratorConfig,
}

impl ChatOrchestrator {
    pub fn new(
        registry: Arc<ModelRegistry>,
        store: Arc<dyn ConversationStore>,
        cache: Arc<dyn SessionCache>,
        config: OrchestratorConfig,
    ) -> Self {
        info!(
            "Initializing ChatOrchestrator: session_ttl={}s, default_timeout={}s",
            config.session_ttl.as_secs(),
            config.default_timeout.as_secs()
        );
        Self {
            registry,
            store,
            cache,
            locks: ConversationLocks::new(),
            config,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Start a conversation bound to an active model.
    pub async fn create_conversation(&self, input: NewConversation) -> Result<Conversation, ChatError> {
        input.validate()?;
        self.registry.resolve(input.model_id).await?;

        let conversation = self.store.create_conversation(&input).await?;
        info!(
            "Created conversation {} for user {} with model {}",
            conversation.id, conversation.user_id, conversation.model_id
        );
        Ok(conversation)
    }

    /// Full durable history, oldest first. Readable even if the model was deactivated.
    pub async fn conversation_messages(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Vec<Message>, ChatError> {
        self.store
            .find_conversation(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;
        self.store.list_messages(conversation_id).await
    }

    pub async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ChatError> {
        self.store.list_conversations(user_id).await
    }

    /// Process one turn and return the answered message.
    pub async fn submit_turn(&self, request: TurnRequest) -> Result<Message, ChatError> {
        let conversation_id = request.conversation_id;

        // Created
        let conversation = self
            .store
            .find_conversation(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;
        if request.content.trim().is_empty() {
            return Err(ChatError::InvalidRequest("Message content is required".into()));
        }

        // ModelResolved
        let model = self.registry.resolve(conversation.model_id).await?;
        if let Some(hint) = request.model_hint.filter(|hint| *hint != model.id) {
            debug!(
                "Ignoring model hint {} for conversation {} bound to model {}",
                hint, conversation_id, model.id
            );
        }
        let backend = self.registry.backend_for(&model)?;
        let deadline = request
            .deadline
            .unwrap_or_else(|| Instant::now() + self.config.default_timeout);
        let limit = model.chat_limit();

        let guard = match tokio::time::timeout_at(deadline, self.locks.acquire(conversation_id)).await {
            Ok(guard) => guard,
            Err(_) => {
                warn!(
                    "Deadline passed while waiting for conversation {}; nothing persisted",
                    conversation_id
                );
                return Err(ChatError::Timeout { message_id: None });
            }
        };

        // HistoryAssembled
        let history = self.assemble_history(conversation_id, limit).await?;
        if Instant::now() >= deadline {
            warn!(
                "Deadline passed before invoking model for conversation {}; nothing persisted",
                conversation_id
            );
            return Err(ChatError::Timeout { message_id: None });
        }

        // Invoking
        let message = self
            .store
            .append_message(conversation_id, model.id, &request.content, &request.username)
            .await?;
        debug!(
            "Invoking model {} for message {} with {} prior turns",
            model.name,
            message.id,
            history.len()
        );

        let invocation = InvocationRequest {
            model: model.name.clone(),
            endpoint: model.endpoint.clone(),
            prompt: request.content.clone(),
            prior_turns: history.clone(),
            sampling: model.sampling,
            deadline,
        };
        let answer = match tokio::time::timeout_at(deadline, backend.invoke(invocation)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(BackendError::DeadlineExceeded)) | Err(_) => {
                warn!(
                    "Model {} timed out for message {} (conversation {})",
                    model.name, message.id, conversation_id
                );
                return Err(ChatError::Timeout { message_id: Some(message.id) });
            }
            Ok(Err(e)) => {
                error!(
                    "Model {} failed for message {} (conversation {}): {}",
                    model.name, message.id, conversation_id, e
                );
                return Err(ChatError::InvocationFailure {
                    message_id: message.id,
                    reason: e.to_string(),
                });
            }
        };

        // Completed
        let completed = self
            .store
            .complete_message(message.id, &answer, &request.username)
            .await
            .map_err(|e| {
                error!("Failed to complete message {}: {}", message.id, e);
                e.with_message_id(message.id)
            })?;

        let mut updated = history;
        updated.push(Turn::new(request.content, answer));
        truncate_oldest(&mut updated, limit);
        self.write_cache(conversation_id, updated).await;

        drop(guard);
        if self.locks.len() > LOCK_PRUNE_THRESHOLD {
            self.locks.prune();
        }

        info!("Completed message {} in conversation {}", completed.id, conversation_id);
        Ok(completed)
    }

    /// Cached history if present, otherwise the newest answered turns from the store.
    async fn assemble_history(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<Turn>, ChatError> {
        match self.cache.get(conversation_id).await {
            Ok(Some(mut turns)) => {
                debug!("Session cache hit for {} ({} turns)", conversation_id, turns.len());
                truncate_oldest(&mut turns, limit);
                return Ok(turns);
            }
            Ok(None) => debug!("Session cache miss for {}", conversation_id),
            Err(e @ CacheError::Malformed { .. }) => {
                warn!("Discarding cached history for {}: {}", conversation_id, e);
                if let Err(e) = self.cache.invalidate(conversation_id).await {
                    warn!("Failed to invalidate session {}: {}", conversation_id, e);
                }
            }
            Err(e) => warn!("Session cache unavailable for {}: {}", conversation_id, e),
        }

        let turns = self.store.recent_turns(conversation_id, limit).await?;
        self.write_cache(conversation_id, turns.clone()).await;
        Ok(turns)
    }

    async fn write_cache(&self, conversation_id: ConversationId, turns: Vec<Turn>) {
        if let Err(e) = self
            .cache
            .put(conversation_id, turns, self.config.session_ttl)
            .await
        {
            warn!("Failed to refresh session {}: {}", conversation_id, e);
        }
    }
}
