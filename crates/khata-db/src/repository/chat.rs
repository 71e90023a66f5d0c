//! # Chat Repository
//!
//! Stored AI-conversation history, scoped by shop and user. The repository
//! only persists and pages messages; producing assistant replies happens
//! elsewhere.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use khata_core::{ChatMessage, ChatRole};

const CHAT_COLUMNS: &str = "id, shop_id, user_id, role, content, created_at";

/// Repository for chat history operations.
#[derive(Debug, Clone)]
pub struct ChatRepository {
    pool: SqlitePool,
}

impl ChatRepository {
    /// Creates a new ChatRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ChatRepository { pool }
    }

    /// Appends a message to a user's conversation.
    pub async fn append(
        &self,
        shop_id: &str,
        user_id: &str,
        role: ChatRole,
        content: &str,
    ) -> DbResult<ChatMessage> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            user_id: user_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        debug!(shop_id = %shop_id, user_id = %user_id, "Appending chat message");

        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, shop_id, user_id, role, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&message.id)
        .bind(&message.shop_id)
        .bind(&message.user_id)
        .bind(message.role)
        .bind(&message.content)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;

        Ok(message)
    }

    /// Returns the most recent `limit` messages of a conversation, oldest
    /// first (ready to replay as context).
    pub async fn history(
        &self,
        shop_id: &str,
        user_id: &str,
        limit: i64,
    ) -> DbResult<Vec<ChatMessage>> {
        let mut messages = sqlx::query_as::<_, ChatMessage>(&format!(
            r#"
            SELECT {CHAT_COLUMNS}
            FROM chat_messages
            WHERE shop_id = ?1 AND user_id = ?2
            ORDER BY created_at DESC, id DESC
            LIMIT ?3
            "#
        ))
        .bind(shop_id)
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }

    /// Deletes a user's whole conversation. Returns the number of messages
    /// removed.
    pub async fn clear(&self, shop_id: &str, user_id: &str) -> DbResult<u64> {
        let result = sqlx::query(
            "DELETE FROM chat_messages WHERE shop_id = ?1 AND user_id = ?2",
        )
        .bind(shop_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
