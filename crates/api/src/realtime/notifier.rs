//! Notification emitter that pushes to connected users.

use async_trait::async_trait;
use domain::services::{Notification, NotificationEmitter};

use super::connections::{ConnectionRegistry, Frame};

/// Logs every notification and forwards it to the recipient's open
/// websockets. Offline recipients only get the log line.
#[derive(Clone)]
pub struct RealtimeNotificationEmitter {
    connections: ConnectionRegistry,
}

impl RealtimeNotificationEmitter {
    pub fn new(connections: ConnectionRegistry) -> Self {
        Self { connections }
    }
}

#[async_trait]
impl NotificationEmitter for RealtimeNotificationEmitter {
    async fn notify(&self, notification: Notification) {
        let recipient_id = notification.recipient_id;
        let kind = notification.kind;
        let delivered = self
            .connections
            .send_if_connected(recipient_id, Frame::Notification(notification))
            .await;
        tracing::info!(
            recipient_id = %recipient_id,
            kind = %kind,
            delivered,
            "Notification emitted"
        );
    }
}
