//! Sport event domain models.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::{field_errors, CoreError, CoreResult, FieldError};
use crate::models::participant::{Participant, ParticipantStatus};

/// Who may discover and join an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(format!("Invalid visibility: {}", s)),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Repetition rule of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::None => "none",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
            Recurrence::Biweekly => "biweekly",
            Recurrence::Monthly => "monthly",
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "biweekly" => Ok(Recurrence::Biweekly),
            "monthly" => Ok(Recurrence::Monthly),
            _ => Err(format!("Invalid recurrence: {}", s)),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scheduled sport event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SportEvent {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub sport: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
    pub visibility: Visibility,
    /// Maximum confirmed participants; `None` means unlimited.
    pub max_participants: Option<i32>,
    pub is_paid: bool,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SportEvent {
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Both coordinates, when the event has them.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Status a fresh join lands in.
    pub fn join_status(&self) -> ParticipantStatus {
        if self.is_public() {
            ParticipantStatus::Confirmed
        } else {
            ParticipantStatus::Pending
        }
    }

    /// Human label used in notifications.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.sport)
    }
}

/// Request payload for creating or replacing an event.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct EventRequest {
    #[validate(length(min = 1, max = 50, message = "Sport must be between 1 and 50 characters"))]
    pub sport: String,

    #[validate(length(max = 100, message = "Title must be at most 100 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 200, message = "Location must be at most 200 characters"))]
    pub location: Option<String>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,

    #[serde(default)]
    pub recurrence: Recurrence,

    #[serde(default)]
    pub visibility: Visibility,

    #[validate(range(min = 2, max = 100, message = "Max participants must be between 2 and 100"))]
    pub max_participants: Option<i32>,

    #[serde(default)]
    pub is_paid: bool,

    #[validate(range(min = 0.0, max = 10000.0, message = "Price must be between 0 and 10000"))]
    pub price: Option<f64>,
}

impl EventRequest {
    /// Runs field validation plus the date and time-range rules.
    pub fn check(&self, today: NaiveDate) -> CoreResult<()> {
        let mut details = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => field_errors(&errors),
        };

        if let Err(e) = shared::validation::validate_not_blank(&self.sport) {
            if !details.iter().any(|d| d.field == "sport") {
                details.push(FieldError::new("sport", message_of(&e)));
            }
        }
        if let Some(Err(e)) = self.latitude.map(shared::validation::validate_latitude) {
            details.push(FieldError::new("latitude", message_of(&e)));
        }
        if let Some(Err(e)) = self.longitude.map(shared::validation::validate_longitude) {
            details.push(FieldError::new("longitude", message_of(&e)));
        }
        if let Err(e) = shared::validation::validate_not_in_past(self.date, today) {
            details.push(FieldError::new("date", message_of(&e)));
        }
        if let Err(e) = shared::validation::validate_time_range(self.start_time, self.end_time) {
            details.push(FieldError::new("end_time", message_of(&e)));
        }
        if self.latitude.is_some() != self.longitude.is_some() {
            details.push(FieldError::new(
                "longitude",
                "Latitude and longitude must be provided together",
            ));
        }

        if details.is_empty() {
            Ok(())
        } else {
            Err(CoreError::invalid_fields(details))
        }
    }

    /// Normalizes the request into the fields a store persists.
    pub fn into_draft(self) -> EventDraft {
        let price = if self.is_paid { self.price } else { None };
        EventDraft {
            sport: self.sport.trim().to_string(),
            title: non_blank(self.title),
            description: non_blank(self.description),
            location: non_blank(self.location),
            latitude: self.latitude,
            longitude: self.longitude,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            recurrence: self.recurrence,
            visibility: self.visibility,
            max_participants: self.max_participants,
            is_paid: self.is_paid,
            price,
        }
    }
}

fn message_of(error: &validator::ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validated event fields ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub sport: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
    pub visibility: Visibility,
    pub max_participants: Option<i32>,
    pub is_paid: bool,
    pub price: Option<f64>,
}

impl EventDraft {
    /// Materializes the draft as a new event.
    pub fn into_event(self, id: Uuid, owner_id: Uuid, now: DateTime<Utc>) -> SportEvent {
        SportEvent {
            id,
            owner_id,
            sport: self.sport,
            title: self.title,
            description: self.description,
            location: self.location,
            latitude: self.latitude,
            longitude: self.longitude,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            recurrence: self.recurrence,
            visibility: self.visibility,
            max_participants: self.max_participants,
            is_paid: self.is_paid,
            price: self.price,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies the draft on top of an existing event.
    pub fn apply_to(self, event: &mut SportEvent, now: DateTime<Utc>) {
        let id = event.id;
        let owner_id = event.owner_id;
        let created_at = event.created_at;
        *event = self.into_event(id, owner_id, created_at);
        event.updated_at = now;
    }
}

/// Event plus its participation state, as returned by get/join/approve.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: SportEvent,
    pub confirmed_count: i64,
    /// Confirmed participants in join order.
    pub participants: Vec<Participant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_status: Option<ParticipantStatus>,
}

/// Search hit annotated with its distance from the query point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EventWithDistance {
    #[serde(flatten)]
    pub event: SportEvent,
    /// Kilometres, rounded to one decimal.
    pub distance_km: f64,
}

/// Query parameters for nearby search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NearbyQuery {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub max_distance: Option<f64>,
    pub sport: Option<String>,
}

/// Query parameters for public listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicEventsQuery {
    pub sport: Option<String>,
}
