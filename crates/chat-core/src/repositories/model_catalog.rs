//! Model catalog trait (port)

use async_trait::async_trait;

use crate::domain::{ModelConfig, ModelId, ShortcutConfig};
use crate::error::ChatError;

/// Read-only view of the model configuration table.
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// Regardless of active flag.
    async fn find_model(&self, id: ModelId) -> Result<Option<ModelConfig>, ChatError>;

    /// `active = None` lists every model.
    async fn list_models(&self, active: Option<bool>) -> Result<Vec<ModelConfig>, ChatError>;

    async fn list_shortcuts(&self, active: Option<bool>) -> Result<Vec<ShortcutConfig>, ChatError>;
}
