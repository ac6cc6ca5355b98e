//! Message service: send, edit, soft delete, read tracking and paging.

use shared::pagination::{Page, PageRequest};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{Message, MessageType, NewMessage, MAX_MESSAGE_LENGTH};
use crate::ports::MessageStore;
use crate::services::conversation::ConversationRegistry;

#[derive(Clone)]
pub struct MessageService {
    registry: ConversationRegistry,
    messages: Arc<dyn MessageStore>,
}

impl MessageService {
    pub fn new(registry: ConversationRegistry, messages: Arc<dyn MessageStore>) -> Self {
        Self { registry, messages }
    }

    pub async fn send(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
        message_type: MessageType,
    ) -> CoreResult<Message> {
        self.registry
            .assert_member(conversation_id, sender_id)
            .await?;
        check_content(content)?;

        let message = self
            .messages
            .append(&NewMessage {
                conversation_id,
                sender_id,
                content: content.to_string(),
                message_type,
            })
            .await?;
        tracing::debug!(
            message_id = %message.id,
            conversation_id = %conversation_id,
            seq = message.seq,
            "Message sent"
        );
        Ok(message)
    }

    /// Replaces the content of the caller's own message.
    pub async fn edit(&self, message_id: Uuid, user_id: Uuid, content: &str) -> CoreResult<Message> {
        let message = self.own_message(message_id, user_id).await?;
        if message.is_deleted {
            return Err(CoreError::conflict("Deleted messages cannot be edited"));
        }
        check_content(content)?;

        match self.messages.edit_content(message_id, content).await? {
            Some(edited) => Ok(edited),
            // Deleted or removed after the read above.
            None => match self.messages.find_message(message_id).await? {
                Some(current) if current.is_deleted => {
                    Err(CoreError::conflict("Deleted messages cannot be edited"))
                }
                _ => Err(CoreError::not_found("Message not found")),
            },
        }
    }

    /// Soft-deletes the caller's own message. Deleting twice is a no-op.
    pub async fn delete(&self, message_id: Uuid, user_id: Uuid) -> CoreResult<Message> {
        let message = self.own_message(message_id, user_id).await?;
        if message.is_deleted {
            return Ok(message);
        }

        let deleted = self
            .messages
            .tombstone(message_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Message not found"))?;
        tracing::debug!(message_id = %message_id, "Message deleted");
        Ok(deleted)
    }

    /// Marks every message from other members as read by `user_id`.
    /// Returns how many receipts were added.
    pub async fn mark_all_read(&self, conversation_id: Uuid, user_id: Uuid) -> CoreResult<u64> {
        self.registry
            .assert_member(conversation_id, user_id)
            .await?;
        Ok(self.messages.mark_all_read(conversation_id, user_id).await?)
    }

    pub async fn count_unread(&self, conversation_id: Uuid, user_id: Uuid) -> CoreResult<i64> {
        self.registry
            .assert_member(conversation_id, user_id)
            .await?;
        Ok(self.messages.count_unread(conversation_id, user_id).await?)
    }

    /// Newest-first page of messages, tombstones included.
    pub async fn list(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        request: PageRequest,
    ) -> CoreResult<Page<Message>> {
        self.registry
            .assert_member(conversation_id, user_id)
            .await?;
        Ok(self.messages.list_page(conversation_id, request).await?)
    }

    async fn own_message(&self, message_id: Uuid, user_id: Uuid) -> CoreResult<Message> {
        let message = self
            .messages
            .find_message(message_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Message not found"))?;
        if message.sender_id != user_id {
            return Err(CoreError::forbidden("You can only change your own messages"));
        }
        Ok(message)
    }
}

fn check_content(content: &str) -> CoreResult<()> {
    if content.trim().is_empty() {
        return Err(CoreError::invalid_field("content", "Message cannot be empty"));
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(CoreError::invalid_field(
            "content",
            format!("Message must be at most {} characters", MAX_MESSAGE_LENGTH),
        ));
    }
    Ok(())
}
