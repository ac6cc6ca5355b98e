//! Message entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Message, MessageType};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for message_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "message_type", rename_all = "lowercase")]
pub enum MessageTypeDb {
    Text,
    Image,
    File,
    System,
}

impl From<MessageTypeDb> for MessageType {
    fn from(db: MessageTypeDb) -> Self {
        match db {
            MessageTypeDb::Text => MessageType::Text,
            MessageTypeDb::Image => MessageType::Image,
            MessageTypeDb::File => MessageType::File,
            MessageTypeDb::System => MessageType::System,
        }
    }
}

impl From<MessageType> for MessageTypeDb {
    fn from(message_type: MessageType) -> Self {
        match message_type {
            MessageType::Text => MessageTypeDb::Text,
            MessageType::Image => MessageTypeDb::Image,
            MessageType::File => MessageTypeDb::File,
            MessageType::System => MessageTypeDb::System,
        }
    }
}

/// Message row with its read-set aggregated from message_reads.
#[derive(Debug, Clone, FromRow)]
pub struct MessageEntity {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageTypeDb,
    pub seq: i64,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub read_by: Vec<Uuid>,
}

impl From<MessageEntity> for Message {
    fn from(entity: MessageEntity) -> Self {
        Self {
            id: entity.id,
            conversation_id: entity.conversation_id,
            sender_id: entity.sender_id,
            content: entity.content,
            message_type: entity.message_type.into(),
            seq: entity.seq,
            is_edited: entity.is_edited,
            is_deleted: entity.is_deleted,
            read_by: entity.read_by,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
