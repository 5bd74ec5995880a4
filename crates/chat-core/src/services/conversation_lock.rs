//! Per-conversation mutual exclusion for turn processing

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ConversationId;

/// In-process, per-conversation async locks.
///
/// Turns for one conversation are serialized; different conversations never
/// contend. Entries with no holder or waiter are removed by [`prune`].
///
/// [`prune`]: ConversationLocks::prune
#[derive(Default)]
pub struct ConversationLocks {
    locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `conversation_id`.
    pub async fn acquire(&self, conversation_id: ConversationId) -> OwnedMutexGuard<()> {
        // Clone under the shard lock so `prune` cannot drop an entry we are about to wait on.
        let lock = self
            .locks
            .entry(conversation_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Remove idle entries. Returns number removed.
    pub fn prune(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
