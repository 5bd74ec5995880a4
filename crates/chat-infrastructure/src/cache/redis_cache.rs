use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info};

use chat_core::cache::{cache_key, decode_turns, encode_turns, CacheError, SessionCache};
use chat_core::domain::{ConversationId, Turn};

/// Redis-backed session cache. Entries are JSON strings with a native TTL,
/// keyed `{key_prefix}:{conversation_id}`.
#[derive(Clone)]
pub struct RedisSessionCache {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisSessionCache {
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(backend_error)?;
        let conn = ConnectionManager::new(client).await.map_err(backend_error)?;
        info!("Connected to Redis session cache");

        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
        })
    }

    fn key(&self, conversation_id: ConversationId) -> String {
        cache_key(&self.key_prefix, conversation_id)
    }
}

fn backend_error(e: redis::RedisError) -> CacheError {
    CacheError::Backend(e.to_string())
}

/// Redis expiry is whole seconds and must be positive.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl SessionCache for RedisSessionCache {
    async fn get(&self, conversation_id: ConversationId) -> Result<Option<Vec<Turn>>, CacheError> {
        let key = self.key(conversation_id);
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(&key).await.map_err(backend_error)?;

        match raw {
            Some(raw) => decode_turns(&key, &raw).map(Some),
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        conversation_id: ConversationId,
        turns: Vec<Turn>,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = self.key(conversation_id);
        let payload = encode_turns(&turns)?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, payload, ttl_seconds(ttl))
            .await
            .map_err(backend_error)?;

        debug!("Cached {} turns under {}", turns.len(), key);
        Ok(())
    }

    async fn invalidate(&self, conversation_id: ConversationId) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(self.key(conversation_id))
            .await
            .map_err(backend_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_second_ttl_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_millis(200)), 1);
        assert_eq!(ttl_seconds(Duration::from_secs(3600)), 3600);
    }

    #[test]
    fn test_invalid_url_is_backend_error() {
        let err = redis::Client::open("not a url").map_err(backend_error).unwrap_err();
        assert!(matches!(err, CacheError::Backend(_)));
    }
}
