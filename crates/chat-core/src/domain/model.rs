//! Model configuration domain entities

use serde::{Deserialize, Serialize};

use super::ModelId;

/// Sampling options forwarded to a model backend.
///
/// The set of recognized options is closed: unknown fields in a payload are
/// dropped during deserialization and never reach the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub top_p: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// When false, `temperature` and `top_p` have no effect.
    #[serde(default)]
    pub do_sample: bool,
}

fn default_max_tokens() -> u32 {
    chat_shared::constants::DEFAULT_MAX_TOKENS
}

fn default_chat_limit() -> u32 {
    chat_shared::constants::DEFAULT_CHAT_LIMIT
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.0,
            max_tokens: default_max_tokens(),
            do_sample: false,
        }
    }
}

impl SamplingParams {
    /// `(temperature, top_p)` if sampling is enabled.
    pub fn effective_sampling(&self) -> Option<(f32, f32)> {
        self.do_sample.then_some((self.temperature, self.top_p))
    }
}

/// A language model known to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub id: ModelId,
    /// Name understood by the backend runtime (e.g. `qwen`).
    pub name: String,
    pub display_name: String,
    pub endpoint: Option<String>,
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    pub sampling: SamplingParams,
    /// Maximum number of prior turns replayed into one invocation.
    #[serde(default = "default_chat_limit")]
    pub max_chat_limit: u32,
    pub active: bool,
    pub is_local: bool,
}

impl ModelConfig {
    pub fn chat_limit(&self) -> usize {
        self.max_chat_limit as usize
    }
}

/// Prompt shortcut ("quick assistant") bound to a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortcutConfig {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub prompt: String,
    pub model_id: ModelId,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_sampling_fields_are_ignored() {
        let params: SamplingParams = serde_json::from_str(
            r#"{"temperature":0.7,"top_p":0.9,"max_tokens":256,"do_sample":true,"stop":["\n"],"seed":42}"#,
        )
        .unwrap();

        assert_eq!(params.max_tokens, 256);
        assert_eq!(params.effective_sampling(), Some((0.7, 0.9)));

        let round = serde_json::to_value(params).unwrap();
        assert!(round.get("stop").is_none());
        assert!(round.get("seed").is_none());
    }

    #[test]
    fn test_sampling_disabled_hides_temperature() {
        let params = SamplingParams {
            temperature: 1.2,
            top_p: 0.5,
            max_tokens: 64,
            do_sample: false,
        };
        assert_eq!(params.effective_sampling(), None);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let params: SamplingParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, SamplingParams::default());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let model = ModelConfig {
            id: 7,
            name: "qwen".into(),
            display_name: "Qwen".into(),
            endpoint: None,
            api_key: Some("secret".into()),
            sampling: SamplingParams::default(),
            max_chat_limit: 20,
            active: true,
            is_local: true,
        };
        let json = serde_json::to_string(&model).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_missing_chat_limit_uses_default() {
        let model: ModelConfig = serde_json::from_str(
            r#"{"id":7,"name":"qwen","display_name":"Qwen","endpoint":null,
                "sampling":{},"active":true,"is_local":true}"#,
        )
        .unwrap();

        assert_eq!(model.max_chat_limit, chat_shared::constants::DEFAULT_CHAT_LIMIT);
        assert_eq!(model.chat_limit(), 20);
    }
}
