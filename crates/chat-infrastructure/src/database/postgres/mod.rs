//! PostgreSQL implementations

mod conversation_store_impl;
mod model_catalog_impl;

pub use conversation_store_impl::PgConversationStore;
pub use model_catalog_impl::PgModelCatalog;

use chat_core::ChatError;
use tracing::error;

/// Log and wrap a sqlx error as a store failure.
pub(crate) fn db_error(operation: &str, e: sqlx::Error) -> ChatError {
    error!("Database error during {}: {}", operation, e);
    ChatError::store(format!("{}: {}", operation, e))
}
