//! Event participation records and their state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Status of a user's participation in one event.
///
/// Transitions:
/// - `Pending -> Confirmed | Declined | Cancelled`
/// - `Confirmed -> Cancelled`
/// - `Cancelled -> Pending | Confirmed` (re-join revives the same record)
/// - `Declined` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "pending",
            ParticipantStatus::Confirmed => "confirmed",
            ParticipantStatus::Declined => "declined",
            ParticipantStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and Confirmed records hold a place in the event.
    pub fn is_active(&self) -> bool {
        matches!(self, ParticipantStatus::Pending | ParticipantStatus::Confirmed)
    }

    pub fn can_transition_to(&self, next: ParticipantStatus) -> bool {
        use ParticipantStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Declined)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Cancelled, Pending)
                | (Cancelled, Confirmed)
        )
    }
}

impl FromStr for ParticipantStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ParticipantStatus::Pending),
            "confirmed" => Ok(ParticipantStatus::Confirmed),
            "declined" => Ok(ParticipantStatus::Declined),
            "cancelled" => Ok(ParticipantStatus::Cancelled),
            _ => Err(format!("Invalid participant status: {}", s)),
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's record of intent toward one event. Unique per (event, user).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Participant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
}
