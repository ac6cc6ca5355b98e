//! Conversation domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::models::message::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    Private,
    Group,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationKind::Private => "private",
            ConversationKind::Group => "group",
        }
    }
}

impl FromStr for ConversationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "private" => Ok(ConversationKind::Private),
            "group" => Ok(ConversationKind::Group),
            _ => Err(format!("Invalid conversation kind: {}", s)),
        }
    }
}

impl fmt::Display for ConversationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of a private conversation: both member ids, sorted, joined by `,`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String);

impl PairKey {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        PairKey(format!("{},{}", low, high))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Conversation {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub created_by: Uuid,
    /// Member ids in ascending order.
    pub member_ids: Vec<Uuid>,
    #[serde(skip_serializing)]
    pub pair_key: Option<String>,
    /// Null until the first message is sent.
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Members other than `user_id`, used for realtime fan-out.
    pub fn other_members(&self, user_id: Uuid) -> impl Iterator<Item = Uuid> + '_ {
        self.member_ids.iter().copied().filter(move |id| *id != user_id)
    }
}

/// Fields for inserting a conversation.
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub kind: ConversationKind,
    pub name: Option<String>,
    pub created_by: Uuid,
    pub member_ids: Vec<Uuid>,
    pub pair_key: Option<PairKey>,
}

impl NewConversation {
    pub fn private(created_by: Uuid, other: Uuid) -> Self {
        let mut member_ids = vec![created_by, other];
        member_ids.sort();
        Self {
            kind: ConversationKind::Private,
            name: None,
            created_by,
            member_ids,
            pair_key: Some(PairKey::new(created_by, other)),
        }
    }

    pub fn group(created_by: Uuid, mut member_ids: Vec<Uuid>, name: Option<String>) -> Self {
        member_ids.sort();
        member_ids.dedup();
        Self {
            kind: ConversationKind::Group,
            name,
            created_by,
            member_ids,
            pair_key: None,
        }
    }
}

/// Request payload for creating a conversation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateConversationRequest {
    #[serde(rename = "type")]
    pub kind: Option<ConversationKind>,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Between 1 and 50 participants are required"))]
    pub participant_ids: Vec<Uuid>,
}

/// Conversation as listed for one member.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub last_message: Option<Message>,
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(PairKey::new(a, b), PairKey::new(b, a));
        let key = PairKey::new(a, b);
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        assert_eq!(key.as_str(), format!("{},{}", low, high));
    }

    #[test]
    fn test_private_conversation_members_sorted() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conv = NewConversation::private(a, b);
        assert_eq!(conv.member_ids.len(), 2);
        assert!(conv.member_ids[0] <= conv.member_ids[1]);
        assert_eq!(conv.pair_key, Some(PairKey::new(b, a)));
    }

    #[test]
    fn test_group_dedups_members() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let conv = NewConversation::group(a, vec![b, a, b], Some("Padel".into()));
        assert_eq!(conv.member_ids.len(), 2);
        assert!(conv.pair_key.is_none());
    }

    #[test]
    fn test_request_reads_type_field() {
        let json = format!(
            r#"{{"type":"group","name":"Runners","participant_ids":["{}"]}}"#,
            Uuid::new_v4()
        );
        let req: CreateConversationRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.kind, Some(ConversationKind::Group));
        assert!(req.validate().is_ok());
    }
}
