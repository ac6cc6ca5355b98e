//! Message repository with read receipts.

use async_trait::async_trait;
use domain::models::{Message, NewMessage, TOMBSTONE};
use domain::ports::{MessageStore, StoreResult};
use shared::pagination::{Page, PageRequest};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{MessageEntity, MessageTypeDb};
use crate::metrics::QueryTimer;

/// Repository for messages and message_reads.
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn append(&self, new: &NewMessage) -> StoreResult<Message> {
        let timer = QueryTimer::new("append_message");
        let mut tx = self.pool.begin().await?;

        let entity = sqlx::query_as::<_, MessageEntity>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, message_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, content, message_type, seq, is_edited,
                      is_deleted, created_at, updated_at, ARRAY[sender_id] AS read_by
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new.conversation_id)
        .bind(new.sender_id)
        .bind(&new.content)
        .bind(MessageTypeDb::from(new.message_type))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO message_reads (message_id, user_id) VALUES ($1, $2)")
            .bind(entity.id)
            .bind(entity.sender_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE conversations SET last_message_at = $2 WHERE id = $1")
            .bind(entity.conversation_id)
            .bind(entity.created_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity.into())
    }

    async fn find_message(&self, message_id: Uuid) -> StoreResult<Option<Message>> {
        let timer = QueryTimer::new("find_message");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT m.id, m.conversation_id, m.sender_id, m.content, m.message_type, m.seq,
                   m.is_edited, m.is_deleted, m.created_at, m.updated_at,
                   ARRAY(
                       SELECT r.user_id FROM message_reads r
                       WHERE r.message_id = m.id ORDER BY r.read_at, r.user_id
                   ) AS read_by
            FROM messages m
            WHERE m.id = $1
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn edit_content(&self, message_id: Uuid, content: &str) -> StoreResult<Option<Message>> {
        let timer = QueryTimer::new("edit_message");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            UPDATE messages AS m
            SET content = $2, is_edited = TRUE, updated_at = NOW()
            WHERE m.id = $1 AND m.is_deleted = FALSE
            RETURNING m.id, m.conversation_id, m.sender_id, m.content, m.message_type, m.seq,
                      m.is_edited, m.is_deleted, m.created_at, m.updated_at,
                      ARRAY(
                          SELECT r.user_id FROM message_reads r
                          WHERE r.message_id = m.id ORDER BY r.read_at, r.user_id
                      ) AS read_by
            "#,
        )
        .bind(message_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn tombstone(&self, message_id: Uuid) -> StoreResult<Option<Message>> {
        let timer = QueryTimer::new("tombstone_message");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            UPDATE messages AS m
            SET content = $2, is_deleted = TRUE, updated_at = NOW()
            WHERE m.id = $1
            RETURNING m.id, m.conversation_id, m.sender_id, m.content, m.message_type, m.seq,
                      m.is_edited, m.is_deleted, m.created_at, m.updated_at,
                      ARRAY(
                          SELECT r.user_id FROM message_reads r
                          WHERE r.message_id = m.id ORDER BY r.read_at, r.user_id
                      ) AS read_by
            "#,
        )
        .bind(message_id)
        .bind(TOMBSTONE)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn mark_all_read(&self, conversation_id: Uuid, user_id: Uuid) -> StoreResult<u64> {
        let timer = QueryTimer::new("mark_all_read");
        let result = sqlx::query(
            r#"
            INSERT INTO message_reads (message_id, user_id)
            SELECT m.id, $2
            FROM messages m
            WHERE m.conversation_id = $1
              AND m.sender_id <> $2
              AND m.is_deleted = FALSE
              AND NOT EXISTS (
                  SELECT 1 FROM message_reads r WHERE r.message_id = m.id AND r.user_id = $2
              )
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected())
    }

    async fn count_unread(&self, conversation_id: Uuid, user_id: Uuid) -> StoreResult<i64> {
        let timer = QueryTimer::new("count_unread_messages");
        let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages m
            WHERE m.conversation_id = $1
              AND m.sender_id <> $2
              AND m.is_deleted = FALSE
              AND NOT EXISTS (
                  SELECT 1 FROM message_reads r WHERE r.message_id = m.id AND r.user_id = $2
              )
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?)
    }

    async fn list_page(
        &self,
        conversation_id: Uuid,
        request: PageRequest,
    ) -> StoreResult<Page<Message>> {
        let timer = QueryTimer::new("list_messages_page");
        let items = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT m.id, m.conversation_id, m.sender_id, m.content, m.message_type, m.seq,
                   m.is_edited, m.is_deleted, m.created_at, m.updated_at,
                   ARRAY(
                       SELECT r.user_id FROM message_reads r
                       WHERE r.message_id = m.id ORDER BY r.read_at, r.user_id
                   ) AS read_by
            FROM messages m
            WHERE m.conversation_id = $1
            ORDER BY m.created_at DESC, m.seq DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = $1")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await?;
        timer.record();

        let items = items.into_iter().map(Into::into).collect();
        Ok(Page::new(items, request, total))
    }

    async fn latest(&self, conversation_id: Uuid) -> StoreResult<Option<Message>> {
        let timer = QueryTimer::new("latest_message");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT m.id, m.conversation_id, m.sender_id, m.content, m.message_type, m.seq,
                   m.is_edited, m.is_deleted, m.created_at, m.updated_at,
                   ARRAY(
                       SELECT r.user_id FROM message_reads r
                       WHERE r.message_id = m.id ORDER BY r.read_at, r.user_id
                   ) AS read_by
            FROM messages m
            WHERE m.conversation_id = $1
            ORDER BY m.created_at DESC, m.seq DESC
            LIMIT 1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }
}
