use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::{CacheError, SessionCache};
use crate::clock::{Clock, SystemClock};
use crate::domain::{ConversationId, Turn};

#[derive(Debug, Clone)]
struct SessionEntry {
    turns: Vec<Turn>,
    written_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl SessionEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Thread-safe in-process session cache
/// Uses DashMap so conversations on different shards never contend
#[derive(Clone)]
pub struct InMemorySessionCache {
    /// conversation_id -> entry
    storage: Arc<DashMap<ConversationId, SessionEntry>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        info!("Initializing in-memory session cache with DashMap");
        Self {
            storage: Arc::new(DashMap::new()),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Drop expired entries. Returns number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let start_len = self.storage.len();
        self.storage.retain(|_, entry| !entry.is_expired(now));
        let count = start_len.saturating_sub(self.storage.len());

        if count > 0 {
            info!("Cleaned up {} expired session entries", count);
        }

        count
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut stats = CacheStats::default();
        for entry in self.storage.iter() {
            if entry.is_expired(now) {
                stats.expired_entries += 1;
            } else {
                stats.live_entries += 1;
                stats.cached_turns += entry.turns.len();
            }
        }
        stats
    }

    fn expiry(&self, now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
        chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for InMemorySessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Vec<Turn>>, CacheError> {
        let now = self.clock.now();
        let Some(entry) = self.storage.get(&conversation_id) else {
            return Ok(None);
        };

        // Lazy deletion
        if entry.is_expired(now) {
            drop(entry); // Release read lock
            self.storage
                .remove_if(&conversation_id, |_, entry| entry.is_expired(now));
            debug!("Session {} expired, removed from cache", conversation_id);
            return Ok(None);
        }

        debug!(
            "Retrieved session {} from cache ({} turns, written {})",
            conversation_id,
            entry.turns.len(),
            entry.written_at
        );
        Ok(Some(entry.turns.clone()))
    }

    async fn put(
        &self,
        conversation_id: ConversationId,
        turns: Vec<Turn>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let now = self.clock.now();
        let entry = SessionEntry {
            turns,
            written_at: now,
            expires_at: self.expiry(now, ttl),
        };
        self.storage.insert(conversation_id, entry);
        debug!("Updated session {} in cache", conversation_id);
        Ok(())
    }

    async fn invalidate(&self, conversation_id: ConversationId) -> Result<(), CacheError> {
        self.storage.remove(&conversation_id);
        Ok(())
    }
}

/// Cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub live_entries: usize,
    pub expired_entries: usize,
    pub cached_turns: usize,
}
