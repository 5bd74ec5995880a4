//! Model backend contract

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::domain::{SamplingParams, Turn};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Request(String),

    #[error("Backend returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Backend response invalid: {0}")]
    InvalidResponse(String),

    #[error("Backend deadline exceeded")]
    DeadlineExceeded,
}

/// Everything a backend needs to answer one turn.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    /// Backend model name (`ModelConfig::name`).
    pub model: String,
    /// Per-model runtime URL; the backend's default is used when absent.
    pub endpoint: Option<String>,
    pub prompt: String,
    /// Oldest first, already bounded by the model's chat limit.
    pub prior_turns: Vec<Turn>,
    pub sampling: SamplingParams,
    pub deadline: Instant,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelBackend: Send + Sync {
    async fn invoke(&self, request: InvocationRequest) -> Result<String, BackendError>;
}
