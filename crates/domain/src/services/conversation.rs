//! Conversation registry: private de-duplication, groups, membership guard.

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{
    Conversation, ConversationKind, ConversationSummary, CreateConversationRequest,
    NewConversation, PairKey,
};
use crate::ports::{ConversationStore, MessageStore, StoreError, UserDirectory};

#[derive(Clone)]
pub struct ConversationRegistry {
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
}

impl ConversationRegistry {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            conversations,
            messages,
            users,
        }
    }

    /// Returns the single private conversation between two friends,
    /// creating it on first use.
    ///
    /// Concurrent callers for the same pair race on the pair-key unique
    /// index; the loser re-reads and returns the winner's conversation.
    pub async fn get_or_create_private(
        &self,
        user_a: Uuid,
        user_b: Uuid,
    ) -> CoreResult<Conversation> {
        if user_a == user_b {
            return Err(CoreError::invalid_field(
                "participant_ids",
                "Cannot start a conversation with yourself",
            ));
        }
        self.require_user(user_a).await?;
        self.require_user(user_b).await?;
        if !self.users.are_friends(user_a, user_b).await? {
            return Err(CoreError::forbidden(
                "You must be friends to start a conversation",
            ));
        }

        let key = PairKey::new(user_a, user_b);
        if let Some(existing) = self.conversations.find_private(&key).await? {
            return Ok(existing);
        }

        match self
            .conversations
            .insert_conversation(&NewConversation::private(user_a, user_b))
            .await
        {
            Ok(created) => {
                tracing::info!(conversation_id = %created.id, "Private conversation created");
                Ok(created)
            }
            Err(StoreError::UniqueViolation(constraint)) => {
                tracing::debug!(
                    pair_key = %key,
                    constraint = %constraint,
                    "Lost private conversation race, re-reading"
                );
                self.conversations
                    .find_private(&key)
                    .await?
                    .ok_or_else(|| CoreError::conflict("Conversation could not be created"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Creates a group with the creator and `member_ids`, all friends of the
    /// creator. Groups are never de-duplicated.
    pub async fn create_group(
        &self,
        creator_id: Uuid,
        member_ids: Vec<Uuid>,
        name: Option<String>,
    ) -> CoreResult<Conversation> {
        let mut others: Vec<Uuid> = member_ids
            .into_iter()
            .filter(|id| *id != creator_id)
            .collect();
        others.sort();
        others.dedup();
        if others.is_empty() {
            return Err(CoreError::invalid_field(
                "participant_ids",
                "A group needs at least one other member",
            ));
        }

        self.require_user(creator_id).await?;
        for member in &others {
            self.require_user(*member).await?;
            if !self.users.are_friends(creator_id, *member).await? {
                return Err(CoreError::forbidden(
                    "You can only add friends to a conversation",
                ));
            }
        }

        let mut members = others;
        members.push(creator_id);
        let name = name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let created = self
            .conversations
            .insert_conversation(&NewConversation::group(creator_id, members, name))
            .await?;
        tracing::info!(
            conversation_id = %created.id,
            members = created.member_ids.len(),
            "Group conversation created"
        );
        Ok(created)
    }

    /// Dispatches a create request to the private or group path.
    pub async fn create(
        &self,
        creator_id: Uuid,
        request: CreateConversationRequest,
    ) -> CoreResult<Conversation> {
        use validator::Validate;
        request.validate()?;

        let mut others: Vec<Uuid> = request
            .participant_ids
            .iter()
            .copied()
            .filter(|id| *id != creator_id)
            .collect();
        others.sort();
        others.dedup();

        let kind = request.kind.unwrap_or(if others.len() == 1 {
            ConversationKind::Private
        } else {
            ConversationKind::Group
        });

        match kind {
            ConversationKind::Private => match others.as_slice() {
                [other] => self.get_or_create_private(creator_id, *other).await,
                [] => Err(CoreError::invalid_field(
                    "participant_ids",
                    "Cannot start a conversation with yourself",
                )),
                _ => Err(CoreError::invalid_field(
                    "participant_ids",
                    "A private conversation has exactly two members",
                )),
            },
            ConversationKind::Group => {
                self.create_group(creator_id, request.participant_ids, request.name)
                    .await
            }
        }
    }

    /// Loads the conversation if `user_id` is a member.
    pub async fn assert_member(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> CoreResult<Conversation> {
        let conversation = self
            .conversations
            .find_conversation(conversation_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Conversation not found"))?;
        if !conversation.has_member(user_id) {
            return Err(CoreError::not_participant());
        }
        Ok(conversation)
    }

    /// The user's conversations, latest activity first.
    pub async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<ConversationSummary>> {
        let conversations = self.conversations.list_for_member(user_id).await?;
        let mut summaries = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            summaries.push(self.summarize(conversation, user_id).await?);
        }
        Ok(summaries)
    }

    pub async fn get(&self, conversation_id: Uuid, user_id: Uuid) -> CoreResult<ConversationSummary> {
        let conversation = self.assert_member(conversation_id, user_id).await?;
        self.summarize(conversation, user_id).await
    }

    async fn summarize(
        &self,
        conversation: Conversation,
        user_id: Uuid,
    ) -> CoreResult<ConversationSummary> {
        let last_message = self.messages.latest(conversation.id).await?;
        let unread_count = self.messages.count_unread(conversation.id, user_id).await?;
        Ok(ConversationSummary {
            conversation,
            last_message,
            unread_count,
        })
    }

    async fn require_user(&self, user_id: Uuid) -> CoreResult<()> {
        match self.users.find_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(CoreError::not_found(format!("User {} not found", user_id))),
        }
    }
}
