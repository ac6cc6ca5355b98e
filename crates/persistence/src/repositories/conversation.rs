//! Conversation repository.

use async_trait::async_trait;
use domain::models::{Conversation, NewConversation, PairKey};
use domain::ports::{ConversationStore, StoreError, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ConversationEntity, ConversationKindDb};
use crate::metrics::QueryTimer;

/// Repository for conversations and conversation_members.
#[derive(Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn insert_conversation(&self, new: &NewConversation) -> StoreResult<Conversation> {
        let timer = QueryTimer::new("insert_conversation");
        let mut tx = self.pool.begin().await?;
        let id = Uuid::new_v4();

        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations (id, kind, name, created_by, pair_key)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(ConversationKindDb::from(new.kind))
        .bind(&new.name)
        .bind(new.created_by)
        .bind(new.pair_key.as_ref().map(PairKey::as_str))
        .execute(&mut *tx)
        .await;
        if let Err(err) = inserted {
            let err = StoreError::from(err);
            if matches!(err, StoreError::UniqueViolation(_)) {
                tracing::debug!(pair_key = ?new.pair_key, "Private conversation already exists");
            }
            timer.record();
            return Err(err);
        }

        sqlx::query(
            r#"
            INSERT INTO conversation_members (conversation_id, user_id)
            SELECT $1, UNNEST($2::uuid[])
            "#,
        )
        .bind(id)
        .bind(&new.member_ids[..])
        .execute(&mut *tx)
        .await?;

        let entity = sqlx::query_as::<_, ConversationEntity>(
            r#"
            SELECT c.id, c.kind, c.name, c.created_by, c.pair_key, c.last_message_at, c.created_at,
                   ARRAY(
                       SELECT m.user_id FROM conversation_members m
                       WHERE m.conversation_id = c.id ORDER BY m.user_id
                   ) AS member_ids
            FROM conversations c
            WHERE c.id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(entity.into())
    }

    async fn find_conversation(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>> {
        let timer = QueryTimer::new("find_conversation");
        let result = sqlx::query_as::<_, ConversationEntity>(
            r#"
            SELECT c.id, c.kind, c.name, c.created_by, c.pair_key, c.last_message_at, c.created_at,
                   ARRAY(
                       SELECT m.user_id FROM conversation_members m
                       WHERE m.conversation_id = c.id ORDER BY m.user_id
                   ) AS member_ids
            FROM conversations c
            WHERE c.id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn find_private(&self, key: &PairKey) -> StoreResult<Option<Conversation>> {
        let timer = QueryTimer::new("find_private_conversation");
        let result = sqlx::query_as::<_, ConversationEntity>(
            r#"
            SELECT c.id, c.kind, c.name, c.created_by, c.pair_key, c.last_message_at, c.created_at,
                   ARRAY(
                       SELECT m.user_id FROM conversation_members m
                       WHERE m.conversation_id = c.id ORDER BY m.user_id
                   ) AS member_ids
            FROM conversations c
            WHERE c.pair_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn list_for_member(&self, user_id: Uuid) -> StoreResult<Vec<Conversation>> {
        let timer = QueryTimer::new("list_conversations_for_member");
        let result = sqlx::query_as::<_, ConversationEntity>(
            r#"
            SELECT c.id, c.kind, c.name, c.created_by, c.pair_key, c.last_message_at, c.created_at,
                   ARRAY(
                       SELECT m.user_id FROM conversation_members m
                       WHERE m.conversation_id = c.id ORDER BY m.user_id
                   ) AS member_ids
            FROM conversations c
            JOIN conversation_members me ON me.conversation_id = c.id AND me.user_id = $1
            ORDER BY c.last_message_at DESC NULLS LAST, c.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into_iter().map(Into::into).collect())
    }
}
