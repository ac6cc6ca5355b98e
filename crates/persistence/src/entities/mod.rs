//! Database entity definitions.

pub mod conversation;
pub mod event;
pub mod message;
pub mod participant;
pub mod user;

pub use conversation::{ConversationEntity, ConversationKindDb};
pub use event::{RecurrenceDb, SportEventEntity, VisibilityDb};
pub use message::{MessageEntity, MessageTypeDb};
pub use participant::{ParticipantEntity, ParticipantStatusDb};
pub use user::UserEntity;
