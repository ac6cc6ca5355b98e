//! Conversation entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Conversation, ConversationKind};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for conversation_kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "conversation_kind", rename_all = "lowercase")]
pub enum ConversationKindDb {
    Private,
    Group,
}

impl From<ConversationKindDb> for ConversationKind {
    fn from(db: ConversationKindDb) -> Self {
        match db {
            ConversationKindDb::Private => ConversationKind::Private,
            ConversationKindDb::Group => ConversationKind::Group,
        }
    }
}

impl From<ConversationKind> for ConversationKindDb {
    fn from(kind: ConversationKind) -> Self {
        match kind {
            ConversationKind::Private => ConversationKindDb::Private,
            ConversationKind::Group => ConversationKindDb::Group,
        }
    }
}

/// Conversation row joined with its member ids.
#[derive(Debug, Clone, FromRow)]
pub struct ConversationEntity {
    pub id: Uuid,
    pub kind: ConversationKindDb,
    pub name: Option<String>,
    pub created_by: Uuid,
    pub pair_key: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub member_ids: Vec<Uuid>,
}

impl From<ConversationEntity> for Conversation {
    fn from(entity: ConversationEntity) -> Self {
        Self {
            id: entity.id,
            kind: entity.kind.into(),
            name: entity.name,
            created_by: entity.created_by,
            member_ids: entity.member_ids,
            pair_key: entity.pair_key,
            last_message_at: entity.last_message_at,
            created_at: entity.created_at,
        }
    }
}
