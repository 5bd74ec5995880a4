//! Router construction

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{conversations, health, models};
use crate::state::AppState;

/// All API routes with state applied. Transport layers (CORS, tracing)
/// are added by the binary.
pub fn build_router(state: AppState) -> Router {
    let chat_routes = Router::new()
        .route("/models", get(models::list_models))
        .route("/shortcuts", get(models::list_shortcuts))
        .route(
            "/conversations",
            post(conversations::create_conversation).get(conversations::list_conversations),
        )
        .route(
            "/conversations/{id}/messages",
            post(conversations::send_message).get(conversations::list_messages),
        );

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1/chat", chat_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use chat_core::backend::{BackendError, InvocationRequest, ModelBackend};
    use chat_core::cache::InMemorySessionCache;
    use chat_core::domain::{ModelConfig, SamplingParams};
    use chat_core::services::{ChatOrchestrator, ModelRegistry, OrchestratorConfig};
    use chat_core::store::InMemoryConversationStore;

    struct EchoBackend;

    #[async_trait]
    impl ModelBackend for EchoBackend {
        async fn invoke(&self, request: InvocationRequest) -> Result<String, BackendError> {
            if request.prompt == "fail" {
                return Err(BackendError::Status { status: 500, body: "boom".into() });
            }
            Ok(format!("echo: {} ({} prior)", request.prompt, request.prior_turns.len()))
        }
    }

    fn model(id: i64, is_local: bool) -> ModelConfig {
        ModelConfig {
            id,
            name: format!("model-{id}"),
            display_name: format!("Model {id}"),
            endpoint: None,
            api_key: Some("secret".into()),
            sampling: SamplingParams::default(),
            max_chat_limit: 20,
            active: true,
            is_local,
        }
    }

    fn app() -> Router {
        let store = Arc::new(InMemoryConversationStore::new());
        store.insert_model(model(1, true));
        store.insert_model(model(2, false));
        let registry = Arc::new(ModelRegistry::new(
            store.clone(),
            store.clone(),
            Arc::new(EchoBackend),
        ));
        let orchestrator = ChatOrchestrator::new(
            registry,
            store,
            Arc::new(InMemorySessionCache::new()),
            OrchestratorConfig::default(),
        );
        build_router(AppState::new(Arc::new(orchestrator)))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-username", "alice");
        let request = match body {
            Some(b) => builder.body(Body::from(b.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn create(app: &Router, model_id: i64) -> String {
        let (status, body) = call(
            app,
            "POST",
            "/api/v1/chat/conversations",
            Some(json!({ "user_id": "u-1", "model_id": model_id, "title": "Chat" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_models_hide_credentials() {
        let (status, body) = call(&app(), "GET", "/api/v1/chat/models?status=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
        assert!(body["data"][0].get("api_key").is_none());
    }

    #[tokio::test]
    async fn test_conversation_flow() {
        let app = app();
        let id = create(&app, 1).await;
        let uri = format!("/api/v1/chat/conversations/{id}/messages");

        let (status, first) = call(&app, "POST", &uri, Some(json!({ "content": "hi" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["data"]["answer"], "echo: hi (0 prior)");
        assert_eq!(first["data"]["created_by"], "alice");

        let (_, second) = call(&app, "POST", &uri, Some(json!({ "content": "again" }))).await;
        assert_eq!(second["data"]["answer"], "echo: again (1 prior)");

        let (status, history) = call(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history["data"].as_array().unwrap().len(), 2);

        let (_, listed) = call(&app, "GET", "/api/v1/chat/conversations?user_id=u-1", None).await;
        assert_eq!(listed["data"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/chat/conversations",
            Some(json!({ "user_id": "u-1", "model_id": 1, "title": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let id = create(&app, 1).await;
        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/v1/chat/conversations/{id}/messages"),
            Some(json!({ "content": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_model_and_conversation() {
        let app = app();
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/chat/conversations",
            Some(json!({ "user_id": "u-1", "model_id": 99, "title": "Chat" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");

        let missing = uuid::Uuid::new_v4();
        let (status, _) = call(
            &app,
            "GET",
            &format!("/api/v1/chat/conversations/{missing}/messages"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_online_model_not_implemented() {
        let app = app();
        let id = create(&app, 2).await;
        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/v1/chat/conversations/{id}/messages"),
            Some(json!({ "content": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert!(body["error"].get("message_id").is_none());
    }

    #[tokio::test]
    async fn test_failed_turn_reports_message_id() {
        let app = app();
        let id = create(&app, 1).await;
        let uri = format!("/api/v1/chat/conversations/{id}/messages");

        let (status, body) = call(&app, "POST", &uri, Some(json!({ "content": "fail" }))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let message_id = body["error"]["message_id"].as_str().unwrap();

        let (_, history) = call(&app, "GET", &uri, None).await;
        assert_eq!(history["data"][0]["id"], message_id);
        assert!(history["data"][0]["answer"].is_null());
    }
}
