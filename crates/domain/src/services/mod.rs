//! Core services for Huddle.
//!
//! Services hold `Arc<dyn Port>` handles and are cheap to clone.

pub mod conversation;
pub mod event_catalog;
pub mod geo;
pub mod messaging;
pub mod notification;
pub mod participation;

pub use conversation::ConversationRegistry;
pub use event_catalog::EventCatalog;
pub use geo::{haversine_km, rank_by_distance, round_to_tenth, EARTH_RADIUS_KM};
pub use messaging::MessageService;
pub use notification::{
    LoggingNotificationEmitter, Notification, NotificationEmitter, NotificationKind,
    RecordingNotificationEmitter,
};
pub use participation::ParticipationLedger;
