//! Wire format for cached turn history.
//!
//! Entries are a JSON array of `{"question": .., "answer": ..}` records.
//! Parsing is strict: anything else is rejected as malformed.

use super::CacheError;
use crate::domain::{ConversationId, Turn};

pub fn cache_key(prefix: &str, conversation_id: ConversationId) -> String {
    format!("{}:{}", prefix, conversation_id)
}

pub fn encode_turns(turns: &[Turn]) -> Result<String, CacheError> {
    serde_json::to_string(turns).map_err(|e| CacheError::Backend(format!("encode failed: {}", e)))
}

pub fn decode_turns(key: &str, raw: &str) -> Result<Vec<Turn>, CacheError> {
    let turns: Vec<Turn> = serde_json::from_str(raw).map_err(|e| CacheError::Malformed {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    if let Some(pos) = turns.iter().position(|t| t.question.is_empty()) {
        return Err(CacheError::Malformed {
            key: key.to_string(),
            reason: format!("record {} has an empty question", pos),
        });
    }

    Ok(turns)
}
