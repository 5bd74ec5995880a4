//! Services

pub mod conversation_lock;
pub mod model_registry;
pub mod orchestrator;

pub use conversation_lock::ConversationLocks;
pub use model_registry::ModelRegistry;
pub use orchestrator::{ChatOrchestrator, OrchestratorConfig, TurnRequest};
