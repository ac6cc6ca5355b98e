//! Domain models for Huddle.

pub mod conversation;
pub mod event;
pub mod message;
pub mod participant;
pub mod user;

pub use conversation::{
    Conversation, ConversationKind, ConversationSummary, CreateConversationRequest,
    NewConversation, PairKey,
};
pub use event::{
    EventDetail, EventDraft, EventRequest, EventWithDistance, NearbyQuery, PublicEventsQuery,
    Recurrence, SportEvent, Visibility,
};
pub use message::{
    EditMessageRequest, MarkReadResult, Message, MessageType, MessagesQuery, NewMessage,
    SendMessageRequest, UnreadCount, MAX_MESSAGE_LENGTH, TOMBSTONE,
};
pub use participant::{Participant, ParticipantStatus};
pub use user::User;
