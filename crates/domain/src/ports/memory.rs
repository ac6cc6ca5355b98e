//! In-memory implementation of every storage port.
//!
//! A single mutex guards all state, so each port call is atomic with
//! respect to every other. Used by unit tests and the api test harness.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use shared::pagination::{Page, PageRequest};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    ConversationStore, DecisionOutcome, EventStore, EventUpdate, JoinOutcome, MessageStore,
    ParticipantStore, StoreError, StoreResult, UserDirectory,
};
use crate::models::{
    Conversation, EventDraft, Message, NewConversation, NewMessage, PairKey, Participant,
    ParticipantStatus, SportEvent, User, TOMBSTONE,
};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    friendships: HashSet<(Uuid, Uuid)>,
    events: Vec<SportEvent>,
    participants: Vec<Participant>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    next_seq: i64,
}

impl State {
    fn event(&self, event_id: Uuid) -> Option<&SportEvent> {
        self.events.iter().find(|e| e.id == event_id)
    }

    fn confirmed_count(&self, event_id: Uuid) -> i64 {
        self.participants
            .iter()
            .filter(|p| p.event_id == event_id && p.status == ParticipantStatus::Confirmed)
            .count() as i64
    }

    fn has_room(&self, event_id: Uuid) -> bool {
        match self.event(event_id).and_then(|e| e.max_participants) {
            Some(cap) => self.confirmed_count(event_id) < i64::from(cap),
            None => true,
        }
    }

    fn participant_mut(&mut self, participant_id: Uuid) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == participant_id)
    }

    fn message_mut(&mut self, message_id: Uuid) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }
}

fn friendship_key(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn by_schedule(events: &mut [SportEvent]) {
    events.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
}

/// Process-local store backing all ports.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    /// Records a symmetric friendship.
    pub async fn befriend(&self, user_a: Uuid, user_b: Uuid) {
        self.state
            .lock()
            .await
            .friendships
            .insert(friendship_key(user_a, user_b));
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn find_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn are_friends(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<bool> {
        Ok(self
            .state
            .lock()
            .await
            .friendships
            .contains(&friendship_key(user_a, user_b)))
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn insert_event(&self, owner_id: Uuid, draft: &EventDraft) -> StoreResult<SportEvent> {
        let event = draft
            .clone()
            .into_event(Uuid::new_v4(), owner_id, Utc::now());
        self.state.lock().await.events.push(event.clone());
        Ok(event)
    }

    async fn find_event(&self, event_id: Uuid) -> StoreResult<Option<SportEvent>> {
        Ok(self.state.lock().await.event(event_id).cloned())
    }

    async fn update_event(&self, event_id: Uuid, draft: &EventDraft) -> StoreResult<EventUpdate> {
        let mut state = self.state.lock().await;
        if state.event(event_id).is_none() {
            return Ok(EventUpdate::Missing);
        }

        let confirmed = state.confirmed_count(event_id);
        if let Some(cap) = draft.max_participants {
            if confirmed > i64::from(cap) {
                return Ok(EventUpdate::BelowConfirmed { confirmed });
            }
        }

        match state.events.iter_mut().find(|e| e.id == event_id) {
            Some(event) => {
                draft.clone().apply_to(event, Utc::now());
                Ok(EventUpdate::Updated(event.clone()))
            }
            None => Ok(EventUpdate::Missing),
        }
    }

    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.events.len();
        state.events.retain(|e| e.id != event_id);
        if state.events.len() == before {
            return Ok(false);
        }
        state.participants.retain(|p| p.event_id != event_id);
        Ok(true)
    }

    async fn list_public(
        &self,
        from: NaiveDate,
        sport: Option<&str>,
    ) -> StoreResult<Vec<SportEvent>> {
        let state = self.state.lock().await;
        let mut events: Vec<SportEvent> = state
            .events
            .iter()
            .filter(|e| e.is_public() && e.date >= from)
            .filter(|e| sport.map_or(true, |s| e.sport.eq_ignore_ascii_case(s)))
            .cloned()
            .collect();
        by_schedule(&mut events);
        Ok(events)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        from: Option<NaiveDate>,
    ) -> StoreResult<Vec<SportEvent>> {
        let state = self.state.lock().await;
        let mut events: Vec<SportEvent> = state
            .events
            .iter()
            .filter(|e| e.owner_id == owner_id)
            .filter(|e| from.map_or(true, |d| e.date >= d))
            .cloned()
            .collect();
        by_schedule(&mut events);
        Ok(events)
    }

    async fn list_confirmed_for(&self, user_id: Uuid) -> StoreResult<Vec<SportEvent>> {
        let state = self.state.lock().await;
        let event_ids: HashSet<Uuid> = state
            .participants
            .iter()
            .filter(|p| p.user_id == user_id && p.status == ParticipantStatus::Confirmed)
            .map(|p| p.event_id)
            .collect();
        let mut events: Vec<SportEvent> = state
            .events
            .iter()
            .filter(|e| event_ids.contains(&e.id))
            .cloned()
            .collect();
        by_schedule(&mut events);
        Ok(events)
    }
}

#[async_trait]
impl ParticipantStore for InMemoryStore {
    async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: ParticipantStatus,
    ) -> StoreResult<JoinOutcome> {
        let mut state = self.state.lock().await;
        if state.event(event_id).is_none() {
            return Ok(JoinOutcome::EventMissing);
        }

        let existing = state
            .participants
            .iter()
            .position(|p| p.event_id == event_id && p.user_id == user_id);

        if let Some(idx) = existing {
            let current = &state.participants[idx];
            if current.status.is_active() {
                return Ok(JoinOutcome::AlreadyActive(current.clone()));
            }
            if current.status == ParticipantStatus::Declined {
                return Ok(JoinOutcome::Declined(current.clone()));
            }
        }

        if !state.has_room(event_id) {
            return Ok(JoinOutcome::Full);
        }

        let now = Utc::now();
        let participant = match existing {
            Some(idx) => {
                let revived = &mut state.participants[idx];
                revived.status = status;
                revived.joined_at = now;
                revived.clone()
            }
            None => {
                let participant = Participant {
                    id: Uuid::new_v4(),
                    event_id,
                    user_id,
                    status,
                    joined_at: now,
                };
                state.participants.push(participant.clone());
                participant
            }
        };
        Ok(JoinOutcome::Joined(participant))
    }

    async fn cancel(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Participant>> {
        let mut state = self.state.lock().await;
        let record = state.participants.iter_mut().find(|p| {
            p.event_id == event_id && p.user_id == user_id && p.status.is_active()
        });
        Ok(record.map(|p| {
            p.status = ParticipantStatus::Cancelled;
            p.clone()
        }))
    }

    async fn confirm(&self, participant_id: Uuid) -> StoreResult<DecisionOutcome> {
        let mut state = self.state.lock().await;
        let (event_id, status) = match state.participants.iter().find(|p| p.id == participant_id)
        {
            Some(p) => (p.event_id, p.status),
            None => return Ok(DecisionOutcome::Missing),
        };

        if status != ParticipantStatus::Pending {
            let current = state.participant_mut(participant_id).map(|p| p.clone());
            return Ok(current.map_or(DecisionOutcome::Missing, DecisionOutcome::NotPending));
        }
        if !state.has_room(event_id) {
            return Ok(DecisionOutcome::Full);
        }

        Ok(match state.participant_mut(participant_id) {
            Some(p) => {
                p.status = ParticipantStatus::Confirmed;
                DecisionOutcome::Applied(p.clone())
            }
            None => DecisionOutcome::Missing,
        })
    }

    async fn decline(&self, participant_id: Uuid) -> StoreResult<DecisionOutcome> {
        let mut state = self.state.lock().await;
        Ok(match state.participant_mut(participant_id) {
            Some(p) if p.status == ParticipantStatus::Pending => {
                p.status = ParticipantStatus::Declined;
                DecisionOutcome::Applied(p.clone())
            }
            Some(p) => DecisionOutcome::NotPending(p.clone()),
            None => DecisionOutcome::Missing,
        })
    }

    async fn find_participant(&self, participant_id: Uuid) -> StoreResult<Option<Participant>> {
        let state = self.state.lock().await;
        Ok(state
            .participants
            .iter()
            .find(|p| p.id == participant_id)
            .cloned())
    }

    async fn find_participation(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Participant>> {
        let state = self.state.lock().await;
        Ok(state
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.user_id == user_id)
            .cloned())
    }

    async fn count_confirmed(&self, event_id: Uuid) -> StoreResult<i64> {
        Ok(self.state.lock().await.confirmed_count(event_id))
    }

    async fn list_by_status(
        &self,
        event_id: Uuid,
        status: ParticipantStatus,
    ) -> StoreResult<Vec<Participant>> {
        let state = self.state.lock().await;
        let mut records: Vec<Participant> = state
            .participants
            .iter()
            .filter(|p| p.event_id == event_id && p.status == status)
            .cloned()
            .collect();
        records.sort_by_key(|p| p.joined_at);
        Ok(records)
    }
}

#[async_trait]
impl ConversationStore for InMemoryStore {
    async fn insert_conversation(&self, new: &NewConversation) -> StoreResult<Conversation> {
        let mut state = self.state.lock().await;
        if let Some(key) = &new.pair_key {
            let taken = state
                .conversations
                .iter()
                .any(|c| c.pair_key.as_deref() == Some(key.as_str()));
            if taken {
                return Err(StoreError::UniqueViolation(
                    "conversations_private_pair_key".to_string(),
                ));
            }
        }

        let mut member_ids = new.member_ids.clone();
        member_ids.sort();
        member_ids.dedup();

        let conversation = Conversation {
            id: Uuid::new_v4(),
            kind: new.kind,
            name: new.name.clone(),
            created_by: new.created_by,
            member_ids,
            pair_key: new.pair_key.as_ref().map(|k| k.as_str().to_string()),
            last_message_at: None,
            created_at: Utc::now(),
        };
        state.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn find_conversation(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>> {
        let state = self.state.lock().await;
        Ok(state
            .conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned())
    }

    async fn find_private(&self, key: &PairKey) -> StoreResult<Option<Conversation>> {
        let state = self.state.lock().await;
        Ok(state
            .conversations
            .iter()
            .find(|c| c.pair_key.as_deref() == Some(key.as_str()))
            .cloned())
    }

    async fn list_for_member(&self, user_id: Uuid) -> StoreResult<Vec<Conversation>> {
        let state = self.state.lock().await;
        let mut conversations: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| c.has_member(user_id))
            .cloned()
            .collect();
        conversations.sort_by_key(|c| {
            (
                c.last_message_at.is_none(),
                Reverse(c.last_message_at),
                Reverse(c.created_at),
            )
        });
        Ok(conversations)
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn append(&self, new: &NewMessage) -> StoreResult<Message> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        state.next_seq += 1;
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: new.conversation_id,
            sender_id: new.sender_id,
            content: new.content.clone(),
            message_type: new.message_type,
            seq: state.next_seq,
            is_edited: false,
            is_deleted: false,
            read_by: vec![new.sender_id],
            created_at: now,
            updated_at: now,
        };

        match state
            .conversations
            .iter_mut()
            .find(|c| c.id == new.conversation_id)
        {
            Some(conversation) => conversation.last_message_at = Some(now),
            None => {
                return Err(StoreError::Backend(format!(
                    "conversation {} does not exist",
                    new.conversation_id
                )))
            }
        }
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, message_id: Uuid) -> StoreResult<Option<Message>> {
        let state = self.state.lock().await;
        Ok(state.messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn edit_content(&self, message_id: Uuid, content: &str) -> StoreResult<Option<Message>> {
        let mut state = self.state.lock().await;
        Ok(state.message_mut(message_id).filter(|m| !m.is_deleted).map(|m| {
            m.content = content.to_string();
            m.is_edited = true;
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn tombstone(&self, message_id: Uuid) -> StoreResult<Option<Message>> {
        let mut state = self.state.lock().await;
        Ok(state.message_mut(message_id).map(|m| {
            m.content = TOMBSTONE.to_string();
            m.is_deleted = true;
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn mark_all_read(&self, conversation_id: Uuid, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut marked = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.conversation_id == conversation_id && m.is_unread_for(user_id))
        {
            message.read_by.push(user_id);
            marked += 1;
        }
        Ok(marked)
    }

    async fn count_unread(&self, conversation_id: Uuid, user_id: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id && m.is_unread_for(user_id))
            .count() as i64)
    }

    async fn list_page(
        &self,
        conversation_id: Uuid,
        request: PageRequest,
    ) -> StoreResult<Page<Message>> {
        let state = self.state.lock().await;
        let mut messages: Vec<&Message> = state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .collect();
        messages.sort_by_key(|m| Reverse((m.created_at, m.seq)));

        let total = messages.len() as i64;
        let items = messages
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, request, total))
    }

    async fn latest(&self, conversation_id: Uuid) -> StoreResult<Option<Message>> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .max_by_key(|m| (m.created_at, m.seq))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageType, Recurrence, Visibility};
    use chrono::{Duration, NaiveTime};

    fn draft(capacity: Option<i32>, visibility: Visibility) -> EventDraft {
        EventDraft {
            sport: "Basketball".into(),
            title: None,
            description: None,
            location: None,
            latitude: None,
            longitude: None,
            date: Utc::now().date_naive() + Duration::days(1),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            recurrence: Recurrence::None,
            visibility,
            max_participants: capacity,
            is_paid: false,
            price: None,
        }
    }

    #[tokio::test]
    async fn test_join_revives_cancelled_record() {
        let store = InMemoryStore::new();
        let event = store
            .insert_event(Uuid::new_v4(), &draft(Some(2), Visibility::Public))
            .await
            .unwrap();
        let user = Uuid::new_v4();

        let first = match store
            .join(event.id, user, ParticipantStatus::Confirmed)
            .await
            .unwrap()
        {
            JoinOutcome::Joined(p) => p,
            other => panic!("unexpected outcome: {:?}", other),
        };
        store.cancel(event.id, user).await.unwrap().unwrap();

        let second = match store
            .join(event.id, user, ParticipantStatus::Confirmed)
            .await
            .unwrap()
        {
            JoinOutcome::Joined(p) => p,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(first.id, second.id);
        assert_eq!(store.count_confirmed(event.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_refuses_capacity_below_confirmed() {
        let store = InMemoryStore::new();
        let event = store
            .insert_event(Uuid::new_v4(), &draft(Some(5), Visibility::Public))
            .await
            .unwrap();
        for _ in 0..3 {
            store
                .join(event.id, Uuid::new_v4(), ParticipantStatus::Confirmed)
                .await
                .unwrap();
        }

        let outcome = store
            .update_event(event.id, &draft(Some(2), Visibility::Public))
            .await
            .unwrap();
        assert_eq!(outcome, EventUpdate::BelowConfirmed { confirmed: 3 });

        let outcome = store
            .update_event(event.id, &draft(Some(3), Visibility::Public))
            .await
            .unwrap();
        assert!(matches!(outcome, EventUpdate::Updated(e) if e.max_participants == Some(3)));
    }

    #[tokio::test]
    async fn test_delete_event_cascades_participants() {
        let store = InMemoryStore::new();
        let event = store
            .insert_event(Uuid::new_v4(), &draft(None, Visibility::Public))
            .await
            .unwrap();
        let user = Uuid::new_v4();
        store
            .join(event.id, user, ParticipantStatus::Confirmed)
            .await
            .unwrap();

        assert!(store.delete_event(event.id).await.unwrap());
        assert!(store
            .find_participation(event.id, user)
            .await
            .unwrap()
            .is_none());
        assert!(!store.delete_event(event.id).await.unwrap());
    }

    #[test]
    fn test_friendship_is_symmetric() {
        let store = InMemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        tokio_test::block_on(store.befriend(a, b));

        assert!(tokio_test::assert_ok!(tokio_test::block_on(store.are_friends(b, a))));
        assert!(!tokio_test::assert_ok!(tokio_test::block_on(
            store.are_friends(a, Uuid::new_v4())
        )));
    }

    #[tokio::test]
    async fn test_duplicate_pair_key_is_unique_violation() {
        let store = InMemoryStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        store
            .insert_conversation(&NewConversation::private(a, b))
            .await
            .unwrap();
        let err = store
            .insert_conversation(&NewConversation::private(b, a))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));
    }

    #[tokio::test]
    async fn test_append_assigns_increasing_seq_and_touches_conversation() {
        let store = InMemoryStore::new();
        let a = Uuid::new_v4();
        let conv = store
            .insert_conversation(&NewConversation::private(a, Uuid::new_v4()))
            .await
            .unwrap();
        assert!(conv.last_message_at.is_none());

        let new = NewMessage {
            conversation_id: conv.id,
            sender_id: a,
            content: "first".into(),
            message_type: MessageType::Text,
        };
        let first = store.append(&new).await.unwrap();
        let second = store.append(&new).await.unwrap();
        assert!(second.seq > first.seq);
        assert_eq!(first.read_by, vec![a]);

        let conv = store.find_conversation(conv.id).await.unwrap().unwrap();
        assert_eq!(conv.last_message_at, Some(second.created_at));
        let latest = store.latest(conv.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }
}
