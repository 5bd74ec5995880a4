//! Repository traits (ports)

pub mod conversation_store;
pub mod model_catalog;

pub use conversation_store::ConversationStore;
pub use model_catalog::ModelCatalog;
