// ============================================================================
// Chat Infrastructure - PostgreSQL Model Catalog
// File: crates/chat-infrastructure/src/database/postgres/model_catalog_impl.rs
// ============================================================================

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use chat_core::domain::{ModelConfig, ModelId, SamplingParams, ShortcutConfig};
use chat_core::error::ChatError;
use chat_core::repositories::ModelCatalog;

use super::db_error;

pub struct PgModelCatalog {
    pool: PgPool,
}

impl PgModelCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ModelRow {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
    pub top_p: f32,
    pub temperature: f32,
    pub max_tokens: i64,
    pub do_sample: bool,
    pub max_chat_limit: i64,
    pub active: bool,
    pub is_local: bool,
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

impl From<ModelRow> for ModelConfig {
    fn from(row: ModelRow) -> Self {
        ModelConfig {
            id: row.id,
            name: row.name,
            display_name: row.display_name,
            endpoint: row.api_url,
            api_key: row.api_key,
            sampling: SamplingParams {
                temperature: row.temperature,
                top_p: row.top_p,
                max_tokens: clamp_u32(row.max_tokens),
                do_sample: row.do_sample,
            },
            max_chat_limit: clamp_u32(row.max_chat_limit),
            active: row.active,
            is_local: row.is_local,
        }
    }
}

#[derive(Debug, FromRow)]
struct ShortcutRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub prompt: String,
    pub model_id: i64,
    pub active: bool,
}

impl From<ShortcutRow> for ShortcutConfig {
    fn from(row: ShortcutRow) -> Self {
        ShortcutConfig {
            id: row.id,
            name: row.name,
            description: row.description,
            prompt: row.prompt,
            model_id: row.model_id,
            active: row.active,
        }
    }
}

const MODEL_COLUMNS: &str = "id, name, display_name, api_key, api_url, top_p, temperature, \
     max_tokens, do_sample, max_chat_limit, active, is_local";

#[async_trait]
impl ModelCatalog for PgModelCatalog {
    async fn find_model(&self, id: ModelId) -> Result<Option<ModelConfig>, ChatError> {
        let row: Option<ModelRow> = sqlx::query_as(&format!(
            "SELECT {} FROM model_configurations WHERE id = $1",
            MODEL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find model", e))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_models(&self, active: Option<bool>) -> Result<Vec<ModelConfig>, ChatError> {
        let rows: Vec<ModelRow> = sqlx::query_as(&format!(
            "SELECT {} FROM model_configurations \
             WHERE ($1::BOOLEAN IS NULL OR active = $1) ORDER BY id",
            MODEL_COLUMNS
        ))
        .bind(active)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list models", e))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_shortcuts(&self, active: Option<bool>) -> Result<Vec<ShortcutConfig>, ChatError> {
        let rows: Vec<ShortcutRow> = sqlx::query_as(
            r#"
            SELECT id, name, description, prompt, model_id, active
            FROM shortcut_configurations
            WHERE ($1::BOOLEAN IS NULL OR active = $1)
            ORDER BY id
            "#,
        )
        .bind(active)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list shortcuts", e))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}
