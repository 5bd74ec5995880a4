//! # Chat Core
//! 
//! Domain entities, storage/cache/backend contracts, and the turn orchestrator.

pub mod backend;
pub mod cache;
pub mod clock;
pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;
pub mod store;

// Re-export domain entities
pub use domain::*;
pub use error::ChatError;
