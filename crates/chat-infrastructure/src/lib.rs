//! # Chat Infrastructure
//! 
//! Database, cache, and model-runtime implementations (adapters).

pub mod database;
pub mod cache;
pub mod llm;

pub use database::{create_pool, run_migrations, PgConversationStore, PgModelCatalog};
pub use cache::RedisSessionCache;
pub use llm::LocalModelBackend;
