//! PostgreSQL implementations of the domain storage ports.

pub mod conversation;
pub mod event;
pub mod message;
pub mod participant;
pub mod user;

pub use conversation::ConversationRepository;
pub use event::EventRepository;
pub use message::MessageRepository;
pub use participant::ParticipantRepository;
pub use user::UserRepository;
