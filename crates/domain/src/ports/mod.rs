//! Storage ports the core services depend on.
//!
//! Every trait is object safe and used as `Arc<dyn Trait>`. Operations that
//! must check and write atomically (join, confirm, capacity edits, private
//! conversation creation) are single calls so each backend can run them
//! under its own exclusion: a row lock in PostgreSQL, a mutex in memory.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::pagination::{Page, PageRequest};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Conversation, EventDraft, Message, NewConversation, NewMessage, PairKey, Participant,
    ParticipantStatus, SportEvent, User,
};

pub use memory::InMemoryStore;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint name.
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Backend(err.to_string())
    }
}

/// Result of an atomic join attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// A record was inserted or a cancelled one revived.
    Joined(Participant),
    /// The user already holds a Pending or Confirmed record.
    AlreadyActive(Participant),
    /// The owner declined this user earlier.
    Declined(Participant),
    /// The join would confirm a participant beyond capacity.
    Full,
    EventMissing,
}

/// Result of an owner decision on a pending record.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionOutcome {
    Applied(Participant),
    NotPending(Participant),
    /// Confirming would exceed capacity; the record stays Pending.
    Full,
    Missing,
}

/// Result of an event update guarded by the confirmed count.
#[derive(Debug, Clone, PartialEq)]
pub enum EventUpdate {
    Updated(SportEvent),
    BelowConfirmed { confirmed: i64 },
    Missing,
}

/// Read access to user profiles and the friendship relation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;

    /// Friendship is symmetric.
    async fn are_friends(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, owner_id: Uuid, draft: &EventDraft) -> StoreResult<SportEvent>;

    async fn find_event(&self, event_id: Uuid) -> StoreResult<Option<SportEvent>>;

    /// Replaces the event's fields unless its new capacity is below the
    /// current confirmed count. Serialized with joins on the same event.
    async fn update_event(&self, event_id: Uuid, draft: &EventDraft) -> StoreResult<EventUpdate>;

    /// Deletes the event and its participant records.
    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool>;

    /// Public events dated on or after `from`, ordered by date then start time.
    async fn list_public(&self, from: NaiveDate, sport: Option<&str>)
        -> StoreResult<Vec<SportEvent>>;

    /// Events owned by `owner_id`, optionally only those dated on or after `from`.
    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        from: Option<NaiveDate>,
    ) -> StoreResult<Vec<SportEvent>>;

    /// Events in which `user_id` holds a Confirmed record.
    async fn list_confirmed_for(&self, user_id: Uuid) -> StoreResult<Vec<SportEvent>>;
}

#[async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Inserts (or revives) the caller's record with `status`, refusing when
    /// an active or declined record exists or when the confirmed count has
    /// reached the event's capacity. Check and write happen atomically.
    async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: ParticipantStatus,
    ) -> StoreResult<JoinOutcome>;

    /// Marks the caller's active record Cancelled. `None` when there is none.
    async fn cancel(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Participant>>;

    /// Pending -> Confirmed, re-checking capacity atomically.
    async fn confirm(&self, participant_id: Uuid) -> StoreResult<DecisionOutcome>;

    /// Pending -> Declined.
    async fn decline(&self, participant_id: Uuid) -> StoreResult<DecisionOutcome>;

    async fn find_participant(&self, participant_id: Uuid) -> StoreResult<Option<Participant>>;

    async fn find_participation(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Participant>>;

    async fn count_confirmed(&self, event_id: Uuid) -> StoreResult<i64>;

    /// Records with `status`, oldest join first.
    async fn list_by_status(
        &self,
        event_id: Uuid,
        status: ParticipantStatus,
    ) -> StoreResult<Vec<Participant>>;
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Inserts the conversation and its members. A second private
    /// conversation for the same pair fails with `UniqueViolation`.
    async fn insert_conversation(&self, new: &NewConversation) -> StoreResult<Conversation>;

    async fn find_conversation(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>>;

    async fn find_private(&self, key: &PairKey) -> StoreResult<Option<Conversation>>;

    /// Conversations `user_id` belongs to, latest activity first, never-active last.
    async fn list_for_member(&self, user_id: Uuid) -> StoreResult<Vec<Conversation>>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Appends the message with the sender as its first reader and bumps the
    /// conversation's last activity in the same transaction.
    async fn append(&self, new: &NewMessage) -> StoreResult<Message>;

    async fn find_message(&self, message_id: Uuid) -> StoreResult<Option<Message>>;

    /// Sets new content and the edited flag. `None` when the message is
    /// missing or already deleted.
    async fn edit_content(&self, message_id: Uuid, content: &str) -> StoreResult<Option<Message>>;

    /// Replaces content with the tombstone and sets the deleted flag.
    async fn tombstone(&self, message_id: Uuid) -> StoreResult<Option<Message>>;

    /// Adds `user_id` to the read-set of every unread, non-deleted message
    /// from other senders. Returns the number of receipts added.
    async fn mark_all_read(&self, conversation_id: Uuid, user_id: Uuid) -> StoreResult<u64>;

    async fn count_unread(&self, conversation_id: Uuid, user_id: Uuid) -> StoreResult<i64>;

    /// Newest first by (created_at, seq), tombstones included.
    async fn list_page(
        &self,
        conversation_id: Uuid,
        request: PageRequest,
    ) -> StoreResult<Page<Message>>;

    async fn latest(&self, conversation_id: Uuid) -> StoreResult<Option<Message>>;
}
