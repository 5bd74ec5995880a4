//! Model registry: resolves logical model ids to configurations and backends

use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::ModelBackend;
use crate::domain::{ConversationId, ModelConfig, ModelId, ShortcutConfig};
use crate::error::ChatError;
use crate::repositories::{ConversationStore, ModelCatalog};

/// Explicitly constructed and injected into the orchestrator.
///
/// Configurations are read from the catalog on every call, so activation
/// changes take effect on the next turn.
pub struct ModelRegistry {
    catalog: Arc<dyn ModelCatalog>,
    conversations: Arc<dyn ConversationStore>,
    local_backend: Arc<dyn ModelBackend>,
}

impl ModelRegistry {
    pub fn new(
        catalog: Arc<dyn ModelCatalog>,
        conversations: Arc<dyn ConversationStore>,
        local_backend: Arc<dyn ModelBackend>,
    ) -> Self {
        Self {
            catalog,
            conversations,
            local_backend,
        }
    }

    /// Active model by id; unknown or inactive ids are `ModelUnavailable`.
    pub async fn resolve(&self, model_id: ModelId) -> Result<ModelConfig, ChatError> {
        match self.catalog.find_model(model_id).await? {
            Some(model) if model.active => {
                debug!("Resolved model {} ({})", model.id, model.name);
                Ok(model)
            }
            Some(_) => {
                warn!("Model {} is inactive", model_id);
                Err(ChatError::ModelUnavailable(model_id))
            }
            None => {
                warn!("Model {} not found", model_id);
                Err(ChatError::ModelUnavailable(model_id))
            }
        }
    }

    /// Model bound to a conversation.
    pub async fn resolve_by_conversation(
        &self,
        conversation_id: ConversationId,
    ) -> Result<ModelConfig, ChatError> {
        let conversation = self
            .conversations
            .find_conversation(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;
        self.resolve(conversation.model_id).await
    }

    /// Callable backend for a resolved model. Only local runtimes are supported.
    pub fn backend_for(&self, model: &ModelConfig) -> Result<Arc<dyn ModelBackend>, ChatError> {
        if !model.is_local {
            return Err(ChatError::NotImplemented(format!(
                "online model {} ({}) is not supported",
                model.id, model.name
            )));
        }
        Ok(self.local_backend.clone())
    }

    pub async fn list_models(&self, active: Option<bool>) -> Result<Vec<ModelConfig>, ChatError> {
        self.catalog.list_models(active).await
    }

    pub async fn list_shortcuts(&self, active: Option<bool>) -> Result<Vec<ShortcutConfig>, ChatError> {
        self.catalog.list_shortcuts(active).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockModelBackend;
    use crate::domain::{NewConversation, SamplingParams};
    use crate::store::InMemoryConversationStore;

    fn model(id: ModelId, active: bool, is_local: bool) -> ModelConfig {
        ModelConfig {
            id,
            name: format!("model-{id}"),
            display_name: format!("Model {id}"),
            endpoint: None,
            api_key: None,
            sampling: SamplingParams::default(),
            max_chat_limit: 20,
            active,
            is_local,
        }
    }

    fn registry() -> (ModelRegistry, Arc<InMemoryConversationStore>) {
        let store = Arc::new(InMemoryConversationStore::new());
        store.insert_model(model(7, true, true));
        store.insert_model(model(8, false, true));
        store.insert_model(model(9, true, false));
        let registry = ModelRegistry::new(
            store.clone(),
            store.clone(),
            Arc::new(MockModelBackend::new()),
        );
        (registry, store)
    }

    #[tokio::test]
    async fn test_resolve_active_model() {
        let (registry, _) = registry();
        assert_eq!(registry.resolve(7).await.unwrap().id, 7);
    }

    #[tokio::test]
    async fn test_resolve_inactive_or_unknown() {
        let (registry, _) = registry();
        assert!(matches!(registry.resolve(8).await, Err(ChatError::ModelUnavailable(8))));
        assert!(matches!(registry.resolve(999).await, Err(ChatError::ModelUnavailable(999))));
    }

    #[tokio::test]
    async fn test_resolve_by_conversation() {
        let (registry, store) = registry();
        let conversation = store
            .create_conversation(&NewConversation::new("u-1", 7, "Chat", "alice"))
            .await
            .unwrap();

        assert_eq!(registry.resolve_by_conversation(conversation.id).await.unwrap().id, 7);

        // Deactivation after creation blocks new turns but not reads.
        store.set_model_active(7, false);
        assert!(matches!(
            registry.resolve_by_conversation(conversation.id).await,
            Err(ChatError::ModelUnavailable(7))
        ));
        assert!(store.find_conversation(conversation.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_resolve_by_missing_conversation() {
        let (registry, _) = registry();
        let id = crate::domain::new_id();
        assert!(matches!(
            registry.resolve_by_conversation(id).await,
            Err(ChatError::ConversationNotFound(x)) if x == id
        ));
    }

    #[tokio::test]
    async fn test_online_backend_not_implemented() {
        let (registry, _) = registry();
        let online = registry.resolve(9).await.unwrap();
        assert!(matches!(registry.backend_for(&online), Err(ChatError::NotImplemented(_))));

        let local = registry.resolve(7).await.unwrap();
        assert!(registry.backend_for(&local).is_ok());
    }
}
