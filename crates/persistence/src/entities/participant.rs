//! Event participant entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Participant, ParticipantStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for participant_status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "lowercase")]
pub enum ParticipantStatusDb {
    Pending,
    Confirmed,
    Declined,
    Cancelled,
}

impl From<ParticipantStatusDb> for ParticipantStatus {
    fn from(db: ParticipantStatusDb) -> Self {
        match db {
            ParticipantStatusDb::Pending => ParticipantStatus::Pending,
            ParticipantStatusDb::Confirmed => ParticipantStatus::Confirmed,
            ParticipantStatusDb::Declined => ParticipantStatus::Declined,
            ParticipantStatusDb::Cancelled => ParticipantStatus::Cancelled,
        }
    }
}

impl From<ParticipantStatus> for ParticipantStatusDb {
    fn from(status: ParticipantStatus) -> Self {
        match status {
            ParticipantStatus::Pending => ParticipantStatusDb::Pending,
            ParticipantStatus::Confirmed => ParticipantStatusDb::Confirmed,
            ParticipantStatus::Declined => ParticipantStatusDb::Declined,
            ParticipantStatus::Cancelled => ParticipantStatusDb::Cancelled,
        }
    }
}

/// Database row mapping for the event_participants table.
#[derive(Debug, Clone, FromRow)]
pub struct ParticipantEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub status: ParticipantStatusDb,
    pub joined_at: DateTime<Utc>,
}

impl From<ParticipantEntity> for Participant {
    fn from(entity: ParticipantEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            user_id: entity.user_id,
            status: entity.status.into(),
            joined_at: entity.joined_at,
        }
    }
}
