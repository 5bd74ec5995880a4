// ============================================================================
// Chat Infrastructure - PostgreSQL Conversation Store
// File: crates/chat-infrastructure/src/database/postgres/conversation_store_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use chat_core::domain::{
    new_id, Conversation, ConversationId, Message, MessageId, ModelId, NewConversation, Turn,
};
use chat_core::error::ChatError;
use chat_core::repositories::ConversationStore;

use super::db_error;

pub struct PgConversationStore {
    pool: PgPool,
}

impl PgConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row types for SQLx mapping
#[derive(Debug, FromRow)]
struct ConversationRow {
    pub id: Uuid,
    pub user_id: String,
    pub model_id: i64,
    pub title: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConversationRow> for Conversation {
    fn from(row: ConversationRow) -> Self {
        Conversation {
            id: row.id,
            user_id: row.user_id,
            model_id: row.model_id,
            title: row.title,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub model_id: i64,
    pub question: String,
    pub answer: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            conversation_id: row.conversation_id,
            model_id: row.model_id,
            question: row.question,
            answer: row.answer,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TurnRow {
    pub question: String,
    pub answer: String,
}

const CONVERSATION_COLUMNS: &str =
    "id, user_id, model_id, title, created_by, updated_by, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, conversation_id, model_id, question, answer, \
     created_by, updated_by, created_at, updated_at";

#[async_trait]
impl ConversationStore for PgConversationStore {
    async fn create_conversation(&self, input: &NewConversation) -> Result<Conversation, ChatError> {
        // The active-model check and the insert are a single statement.
        let row: Option<ConversationRow> = sqlx::query_as(&format!(
            r#"
            INSERT INTO conversations (id, user_id, model_id, title, created_by, updated_by)
            SELECT $1, $2, m.id, $4, $5, $5
            FROM model_configurations m
            WHERE m.id = $3 AND m.active
            RETURNING {}
            "#,
            CONVERSATION_COLUMNS
        ))
        .bind(new_id())
        .bind(&input.user_id)
        .bind(input.model_id)
        .bind(&input.title)
        .bind(&input.username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("create conversation", e))?;

        let conversation: Conversation = row
            .ok_or(ChatError::ModelUnavailable(input.model_id))?
            .into();
        info!("Conversation {} created for user {}", conversation.id, conversation.user_id);
        Ok(conversation)
    }

    async fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, ChatError> {
        let row: Option<ConversationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("find conversation", e))?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>, ChatError> {
        let rows: Vec<ConversationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM conversations WHERE user_id = $1 ORDER BY updated_at DESC",
            CONVERSATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list conversations", e))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn append_message(
        &self,
        conversation_id: ConversationId,
        model_id: ModelId,
        question: &str,
        username: &str,
    ) -> Result<Message, ChatError> {
        let row: MessageRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO messages (id, conversation_id, model_id, question, created_by, updated_by)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(new_id())
        .bind(conversation_id)
        .bind(model_id)
        .bind(question)
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return ChatError::ConversationNotFound(conversation_id);
                }
            }
            db_error("append message", e)
        })?;

        debug!("Message {} appended to conversation {}", row.id, conversation_id);
        Ok(row.into())
    }

    async fn complete_message(
        &self,
        message_id: MessageId,
        answer: &str,
        username: &str,
    ) -> Result<Message, ChatError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("begin complete message", e))?;

        let row: Option<MessageRow> = sqlx::query_as(&format!(
            r#"
            UPDATE messages
            SET answer = $2, updated_by = $3, updated_at = now()
            WHERE id = $1 AND answer IS NULL
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(message_id)
        .bind(answer)
        .bind(username)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error("complete message", e))?;

        let row = row.ok_or_else(|| {
            ChatError::store(format!("message {} not found or already answered", message_id))
        })?;

        sqlx::query(
            "UPDATE conversations SET updated_by = $2, updated_at = now() WHERE id = $1",
        )
        .bind(row.conversation_id)
        .bind(username)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("touch conversation", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("commit complete message", e))?;

        Ok(row.into())
    }

    async fn list_messages(&self, conversation_id: ConversationId) -> Result<Vec<Message>, ChatError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC, seq ASC",
            MESSAGE_COLUMNS
        ))
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("list messages", e))?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn recent_turns(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<Turn>, ChatError> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            r#"
            SELECT question, answer FROM (
                SELECT question, answer, created_at, seq
                FROM messages
                WHERE conversation_id = $1 AND answer IS NOT NULL
                ORDER BY created_at DESC, seq DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(conversation_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("load recent turns", e))?;

        Ok(rows
            .into_iter()
            .map(|r| Turn::new(r.question, r.answer))
            .collect())
    }
}
