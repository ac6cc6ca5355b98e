//! Notification emission.
//!
//! Delivery is owned by an external collaborator. The core only hands over a
//! [`Notification`] and never waits on, or fails because of, the outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ParticipantJoined,
    JoinRequested,
    ParticipationApproved,
    ParticipationDeclined,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::ParticipantJoined => "participant_joined",
            NotificationKind::JoinRequested => "join_requested",
            NotificationKind::ParticipationApproved => "participation_approved",
            NotificationKind::ParticipationDeclined => "participation_declined",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub recipient_id: Uuid,
    pub from_user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    /// Id of the entity the notification points at, e.g. an event.
    pub reference_id: Option<String>,
}

/// Fire-and-forget sink for notifications.
///
/// Implementations log their own failures; nothing is returned.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Emitter that only logs. Used when no delivery channel is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotificationEmitter;

#[async_trait]
impl NotificationEmitter for LoggingNotificationEmitter {
    async fn notify(&self, notification: Notification) {
        tracing::info!(
            recipient_id = %notification.recipient_id,
            kind = %notification.kind,
            reference_id = ?notification.reference_id,
            "Notification emitted"
        );
    }
}

/// Emitter that keeps everything it receives, for assertions in tests.
#[derive(Debug, Default)]
pub struct RecordingNotificationEmitter {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotificationEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationEmitter for RecordingNotificationEmitter {
    async fn notify(&self, notification: Notification) {
        self.sent.lock().await.push(notification);
    }
}
