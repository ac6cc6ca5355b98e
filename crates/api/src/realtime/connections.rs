//! Registry of open websocket connections keyed by user id.

use domain::models::Message;
use domain::services::Notification;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::middleware::metrics::{record_connections, record_frame_sent};

/// A server-to-client websocket frame: `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Frame {
    Notification(Notification),
    NewMessage(Message),
    MessageUpdated(Message),
    MessagesRead(MessagesRead),
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Notification(_) => "notification",
            Frame::NewMessage(_) => "new_message",
            Frame::MessageUpdated(_) => "message_updated",
            Frame::MessagesRead(_) => "messages_read",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagesRead {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub marked: u64,
}

type Senders = HashMap<Uuid, HashMap<Uuid, mpsc::Sender<Frame>>>;

/// Open connections per user. A user may hold several (one per device);
/// each is identified by its own connection id so a late disconnect never
/// removes a newer connection.
#[derive(Clone)]
pub struct ConnectionRegistry {
    senders: Arc<RwLock<Senders>>,
    capacity: usize,
}

impl ConnectionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            senders: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Registers a connection and returns its id plus the receiving end.
    pub async fn register(&self, user_id: Uuid) -> (Uuid, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let connection_id = Uuid::new_v4();
        let mut senders = self.senders.write().await;
        senders.entry(user_id).or_default().insert(connection_id, tx);
        record_connections(senders.values().map(HashMap::len).sum());
        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Websocket registered");
        (connection_id, rx)
    }

    pub async fn unregister(&self, user_id: Uuid, connection_id: Uuid) {
        let mut senders = self.senders.write().await;
        if let Some(connections) = senders.get_mut(&user_id) {
            connections.remove(&connection_id);
            if connections.is_empty() {
                senders.remove(&user_id);
            }
        }
        record_connections(senders.values().map(HashMap::len).sum());
        tracing::debug!(user_id = %user_id, connection_id = %connection_id, "Websocket unregistered");
    }

    pub async fn is_connected(&self, user_id: Uuid) -> bool {
        self.senders.read().await.contains_key(&user_id)
    }

    /// Delivers the frame to every open connection of `user_id`. Offline
    /// users and full buffers drop the frame. Returns how many connections
    /// accepted it.
    pub async fn send_if_connected(&self, user_id: Uuid, frame: Frame) -> usize {
        let senders = self.senders.read().await;
        let Some(connections) = senders.get(&user_id) else {
            return 0;
        };

        let mut delivered = 0;
        for (connection_id, tx) in connections {
            match tx.try_send(frame.clone()) {
                Ok(()) => {
                    delivered += 1;
                    record_frame_sent(frame.kind());
                }
                Err(e) => tracing::warn!(
                    user_id = %user_id,
                    connection_id = %connection_id,
                    frame = frame.kind(),
                    error = %e,
                    "Dropped realtime frame"
                ),
            }
        }
        delivered
    }

    /// Sends the frame to every listed user except `skip`.
    pub async fn fan_out(&self, recipients: &[Uuid], skip: Uuid, frame: Frame) {
        for user_id in recipients.iter().copied().filter(|id| *id != skip) {
            self.send_if_connected(user_id, frame.clone()).await;
        }
    }
}
