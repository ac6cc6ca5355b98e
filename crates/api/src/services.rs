//! Wiring of the domain services onto a storage backend.

use domain::ports::{
    ConversationStore, EventStore, InMemoryStore, MessageStore, ParticipantStore, UserDirectory,
};
use domain::services::{
    ConversationRegistry, EventCatalog, MessageService, NotificationEmitter, ParticipationLedger,
};
use persistence::{
    ConversationRepository, EventRepository, MessageRepository, ParticipantRepository,
    UserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;

/// The domain services handlers call into. Cheap to clone.
#[derive(Clone)]
pub struct Services {
    pub catalog: EventCatalog,
    pub ledger: ParticipationLedger,
    pub conversations: ConversationRegistry,
    pub messages: MessageService,
}

impl Services {
    fn build(
        users: Arc<dyn UserDirectory>,
        events: Arc<dyn EventStore>,
        participants: Arc<dyn ParticipantStore>,
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        notifier: Arc<dyn NotificationEmitter>,
    ) -> Self {
        let registry = ConversationRegistry::new(conversations, messages.clone(), users.clone());
        Self {
            catalog: EventCatalog::new(events.clone(), participants.clone(), users),
            ledger: ParticipationLedger::new(events, participants, notifier),
            messages: MessageService::new(registry.clone(), messages),
            conversations: registry,
        }
    }

    /// Services backed by the PostgreSQL repositories.
    pub fn postgres(pool: PgPool, notifier: Arc<dyn NotificationEmitter>) -> Self {
        Self::build(
            Arc::new(UserRepository::new(pool.clone())),
            Arc::new(EventRepository::new(pool.clone())),
            Arc::new(ParticipantRepository::new(pool.clone())),
            Arc::new(ConversationRepository::new(pool.clone())),
            Arc::new(MessageRepository::new(pool)),
            notifier,
        )
    }

    /// Services backed by a single in-memory store.
    pub fn in_memory(store: Arc<InMemoryStore>, notifier: Arc<dyn NotificationEmitter>) -> Self {
        Self::build(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            notifier,
        )
    }
}
