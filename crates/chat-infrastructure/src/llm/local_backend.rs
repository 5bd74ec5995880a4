use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use chat_core::backend::{BackendError, InvocationRequest, ModelBackend};

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Client for a locally hosted, OpenAI-compatible runtime
/// (`POST {base_url}/v1/chat/completions`).
#[derive(Clone)]
pub struct LocalModelBackend {
    client: Client,
    base_url: String,
}

impl LocalModelBackend {
    /// `timeout` caps every request; a tighter turn deadline wins.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// `{endpoint or base_url}/v1/chat/completions`.
    fn completions_url(&self, endpoint: Option<&str>) -> String {
        let base = endpoint
            .map(|e| e.trim_end_matches('/'))
            .filter(|e| !e.is_empty())
            .unwrap_or(self.base_url.as_str());
        format!("{}/v1/chat/completions", base)
    }

    fn build_body<'a>(request: &'a InvocationRequest) -> ChatCompletionRequest<'a> {
        let mut messages = Vec::with_capacity(request.prior_turns.len() * 2 + 1);
        for turn in &request.prior_turns {
            messages.push(ChatMessage { role: "user", content: &turn.question });
            messages.push(ChatMessage { role: "assistant", content: &turn.answer });
        }
        messages.push(ChatMessage { role: "user", content: &request.prompt });

        let sampling = request.sampling.effective_sampling();
        ChatCompletionRequest {
            model: &request.model,
            messages,
            max_tokens: request.sampling.max_tokens,
            temperature: sampling.map(|(t, _)| t),
            top_p: sampling.map(|(_, p)| p),
            stream: false,
        }
    }
}

#[async_trait]
impl ModelBackend for LocalModelBackend {
    async fn invoke(&self, request: InvocationRequest) -> Result<String, BackendError> {
        let remaining = request.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(BackendError::DeadlineExceeded);
        }

        debug!(
            "Invoking model {} with {} prior turns",
            request.model,
            request.prior_turns.len()
        );

        let body = Self::build_body(&request);
        let response = self
            .client
            .post(self.completions_url(request.endpoint.as_deref()))
            .timeout(remaining)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::DeadlineExceeded
                } else {
                    BackendError::Request(format!("Failed to call model runtime: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Model runtime returned {}: {}", status, body);
            return Err(BackendError::Status { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::DeadlineExceeded
            } else {
                BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| BackendError::InvalidResponse("No choices returned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::domain::{SamplingParams, Turn};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(sampling: SamplingParams, within: Duration) -> InvocationRequest {
        InvocationRequest {
            model: "qwen".into(),
            endpoint: None,
            prompt: "and now?".into(),
            prior_turns: vec![Turn::new("hi", "hello")],
            sampling,
            deadline: Instant::now() + within,
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
    }

    #[tokio::test]
    async fn test_invoke_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("fine")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = LocalModelBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let answer = backend
            .invoke(request(SamplingParams::default(), Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(answer, "fine");
    }

    #[tokio::test]
    async fn test_history_and_sampling_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .mount(&server)
            .await;

        let backend = LocalModelBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let disabled = SamplingParams {
            temperature: 0.9,
            top_p: 0.5,
            max_tokens: 64,
            do_sample: false,
        };
        backend.invoke(request(disabled, Duration::from_secs(5))).await.unwrap();

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body["model"], "qwen");
        assert_eq!(body["max_tokens"], 64);
        assert!(body.get("temperature").is_none());
        assert!(body.get("top_p").is_none());

        let roles: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, ["user", "assistant", "user"]);
        assert_eq!(body["messages"][2]["content"], "and now?");
    }

    #[tokio::test]
    async fn test_model_endpoint_overrides_base_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("routed")))
            .expect(1)
            .mount(&server)
            .await;

        // Default points nowhere; the model's own endpoint must be used.
        let backend =
            LocalModelBackend::new("http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
        let mut req = request(SamplingParams::default(), Duration::from_secs(5));
        req.endpoint = Some(format!("{}/", server.uri()));

        assert_eq!(backend.invoke(req).await.unwrap(), "routed");
    }

    #[test]
    fn test_blank_endpoint_falls_back_to_base_url() {
        let backend = LocalModelBackend::new("http://rt:8000/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.completions_url(Some("")),
            "http://rt:8000/v1/chat/completions"
        );
        assert_eq!(
            backend.completions_url(None),
            "http://rt:8000/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let backend = LocalModelBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = backend
            .invoke(request(SamplingParams::default(), Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let backend = LocalModelBackend::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = backend
            .invoke(request(SamplingParams::default(), Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_runtime_hits_deadline() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("late"))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let backend = LocalModelBackend::new(server.uri(), Duration::from_secs(30)).unwrap();
        let err = backend
            .invoke(request(SamplingParams::default(), Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::DeadlineExceeded));
    }
}
