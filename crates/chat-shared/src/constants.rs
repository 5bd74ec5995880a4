//! Application-wide constants

/// Session memory entries expire one hour after the last write.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
/// Cache keys are `{prefix}:{conversation_id}`.
pub const DEFAULT_SESSION_KEY_PREFIX: &str = "conv";
pub const DEFAULT_CHAT_LIMIT: u32 = 20;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_USERNAME: &str = "system";
