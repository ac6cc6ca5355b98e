//! Sport event entity (database row mapping).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use domain::models::{Recurrence, SportEvent, Visibility};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for event_visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_visibility", rename_all = "lowercase")]
pub enum VisibilityDb {
    Public,
    Private,
}

impl From<VisibilityDb> for Visibility {
    fn from(db: VisibilityDb) -> Self {
        match db {
            VisibilityDb::Public => Visibility::Public,
            VisibilityDb::Private => Visibility::Private,
        }
    }
}

impl From<Visibility> for VisibilityDb {
    fn from(visibility: Visibility) -> Self {
        match visibility {
            Visibility::Public => VisibilityDb::Public,
            Visibility::Private => VisibilityDb::Private,
        }
    }
}

/// Database enum for event_recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "event_recurrence", rename_all = "lowercase")]
pub enum RecurrenceDb {
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl From<RecurrenceDb> for Recurrence {
    fn from(db: RecurrenceDb) -> Self {
        match db {
            RecurrenceDb::None => Recurrence::None,
            RecurrenceDb::Daily => Recurrence::Daily,
            RecurrenceDb::Weekly => Recurrence::Weekly,
            RecurrenceDb::Biweekly => Recurrence::Biweekly,
            RecurrenceDb::Monthly => Recurrence::Monthly,
        }
    }
}

impl From<Recurrence> for RecurrenceDb {
    fn from(recurrence: Recurrence) -> Self {
        match recurrence {
            Recurrence::None => RecurrenceDb::None,
            Recurrence::Daily => RecurrenceDb::Daily,
            Recurrence::Weekly => RecurrenceDb::Weekly,
            Recurrence::Biweekly => RecurrenceDb::Biweekly,
            Recurrence::Monthly => RecurrenceDb::Monthly,
        }
    }
}

/// Database row mapping for the sport_events table.
#[derive(Debug, Clone, FromRow)]
pub struct SportEventEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub sport: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: RecurrenceDb,
    pub visibility: VisibilityDb,
    pub max_participants: Option<i32>,
    pub is_paid: bool,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SportEventEntity> for SportEvent {
    fn from(entity: SportEventEntity) -> Self {
        Self {
            id: entity.id,
            owner_id: entity.owner_id,
            sport: entity.sport,
            title: entity.title,
            description: entity.description,
            location: entity.location,
            latitude: entity.latitude,
            longitude: entity.longitude,
            date: entity.event_date,
            start_time: entity.start_time,
            end_time: entity.end_time,
            recurrence: entity.recurrence.into(),
            visibility: entity.visibility.into(),
            max_participants: entity.max_participants,
            is_paid: entity.is_paid,
            price: entity.price,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_conversion_is_lossless() {
        for v in [Visibility::Public, Visibility::Private] {
            assert_eq!(Visibility::from(VisibilityDb::from(v)), v);
        }
    }

    #[test]
    fn test_recurrence_conversion_is_lossless() {
        for r in [
            Recurrence::None,
            Recurrence::Daily,
            Recurrence::Weekly,
            Recurrence::Biweekly,
            Recurrence::Monthly,
        ] {
            assert_eq!(Recurrence::from(RecurrenceDb::from(r)), r);
        }
    }
}
