//! Session memory cache
//!
//! Conversation-keyed, TTL-bounded cache of the most recent completed turns.
//! A miss (or an expired entry) always means "reload from the conversation
//! store", never "the conversation has no history".

pub mod codec;
mod memory;

pub use codec::{cache_key, decode_turns, encode_turns};
pub use memory::{CacheStats, InMemorySessionCache};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::{ConversationId, Turn};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Malformed cache entry {key}: {reason}")]
    Malformed { key: String, reason: String },
}

#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Ordered turn history, or `None` on miss/expiry.
    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Vec<Turn>>, CacheError>;

    /// Replace the entry; expiry is measured from this write.
    async fn put(
        &self,
        conversation_id: ConversationId,
        turns: Vec<Turn>,
        ttl: Duration,
    ) -> Result<(), CacheError>;

    async fn invalidate(&self, conversation_id: ConversationId) -> Result<(), CacheError>;
}
