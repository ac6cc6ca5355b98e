//! Process-local realtime fan-out over websockets.

pub mod connections;
pub mod notifier;

pub use connections::{ConnectionRegistry, Frame, MessagesRead};
pub use notifier::RealtimeNotificationEmitter;
