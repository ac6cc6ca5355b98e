//! Event catalog: create, read, update, delete, listings and nearby search.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{
    EventDetail, EventRequest, EventWithDistance, NearbyQuery, ParticipantStatus, SportEvent,
};
use crate::ports::{EventStore, EventUpdate, ParticipantStore, UserDirectory};
use crate::services::geo::{rank_by_distance, DEFAULT_SEARCH_DISTANCE_KM};

#[derive(Clone)]
pub struct EventCatalog {
    events: Arc<dyn EventStore>,
    participants: Arc<dyn ParticipantStore>,
    users: Arc<dyn UserDirectory>,
}

impl EventCatalog {
    pub fn new(
        events: Arc<dyn EventStore>,
        participants: Arc<dyn ParticipantStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            events,
            participants,
            users,
        }
    }

    pub async fn create(&self, owner_id: Uuid, request: EventRequest) -> CoreResult<SportEvent> {
        request.check(today())?;
        if request.is_paid {
            self.require_pro(owner_id).await?;
        }

        let event = self
            .events
            .insert_event(owner_id, &request.into_draft())
            .await?;
        tracing::info!(event_id = %event.id, owner_id = %owner_id, "Event created");
        Ok(event)
    }

    /// Loads an event with its participation state as seen by `requester_id`.
    pub async fn get(&self, event_id: Uuid, requester_id: Option<Uuid>) -> CoreResult<EventDetail> {
        let event = self.load(event_id).await?;
        let my_status = match requester_id {
            Some(user_id) => self
                .participants
                .find_participation(event_id, user_id)
                .await?
                .map(|p| p.status),
            None => None,
        };

        if !event.is_public() {
            let is_owner = requester_id.is_some_and(|id| event.is_owned_by(id));
            let is_active = my_status.is_some_and(|s| s.is_active());
            if !is_owner && !is_active {
                return Err(CoreError::forbidden("This event is private"));
            }
        }

        self.detail_with_status(event, my_status).await
    }

    /// Detail view of an event the caller has already been authorized for.
    pub async fn detail(&self, event_id: Uuid, requester_id: Uuid) -> CoreResult<EventDetail> {
        let event = self.load(event_id).await?;
        let my_status = self
            .participants
            .find_participation(event_id, requester_id)
            .await?
            .map(|p| p.status);
        self.detail_with_status(event, my_status).await
    }

    pub async fn update(
        &self,
        event_id: Uuid,
        owner_id: Uuid,
        request: EventRequest,
    ) -> CoreResult<SportEvent> {
        let event = self.owned(event_id, owner_id).await?;
        request.check(today())?;
        if request.is_paid && !event.is_paid {
            self.require_pro(owner_id).await?;
        }

        match self
            .events
            .update_event(event_id, &request.into_draft())
            .await?
        {
            EventUpdate::Updated(event) => {
                tracing::info!(event_id = %event_id, "Event updated");
                Ok(event)
            }
            EventUpdate::BelowConfirmed { confirmed } => Err(CoreError::conflict(format!(
                "Capacity cannot be lower than the {} confirmed participants",
                confirmed
            ))),
            EventUpdate::Missing => Err(CoreError::not_found("Event not found")),
        }
    }

    pub async fn delete(&self, event_id: Uuid, owner_id: Uuid) -> CoreResult<()> {
        self.owned(event_id, owner_id).await?;
        if !self.events.delete_event(event_id).await? {
            return Err(CoreError::not_found("Event not found"));
        }
        tracing::info!(event_id = %event_id, "Event deleted");
        Ok(())
    }

    /// Upcoming public events, optionally filtered by sport.
    pub async fn list_public(&self, sport: Option<&str>) -> CoreResult<Vec<SportEvent>> {
        Ok(self.events.list_public(today(), sport_filter(sport)).await?)
    }

    pub async fn list_owned(&self, owner_id: Uuid) -> CoreResult<Vec<SportEvent>> {
        Ok(self.events.list_by_owner(owner_id, None).await?)
    }

    /// Upcoming events of `owner_id`. Other users only see the public ones.
    pub async fn list_upcoming(
        &self,
        owner_id: Uuid,
        requester_id: Uuid,
    ) -> CoreResult<Vec<SportEvent>> {
        let events = self.events.list_by_owner(owner_id, Some(today())).await?;
        if owner_id == requester_id {
            return Ok(events);
        }
        Ok(events.into_iter().filter(|e| e.is_public()).collect())
    }

    pub async fn list_participating(&self, user_id: Uuid) -> CoreResult<Vec<SportEvent>> {
        Ok(self.events.list_confirmed_for(user_id).await?)
    }

    /// Public upcoming events within `max_distance` km of the query point,
    /// nearest first.
    pub async fn search_nearby(&self, query: &NearbyQuery) -> CoreResult<Vec<EventWithDistance>> {
        let (lat, lon) = match (query.latitude, query.longitude) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => return Err(CoreError::invalid_location()),
        };
        let max_km = query.max_distance.unwrap_or(DEFAULT_SEARCH_DISTANCE_KM);

        shared::validation::validate_latitude(lat)
            .map_err(|e| CoreError::invalid_field("latitude", describe(&e)))?;
        shared::validation::validate_longitude(lon)
            .map_err(|e| CoreError::invalid_field("longitude", describe(&e)))?;
        shared::validation::validate_search_distance(max_km)
            .map_err(|e| CoreError::invalid_field("max_distance", describe(&e)))?;

        let candidates = self
            .events
            .list_public(today(), sport_filter(query.sport.as_deref()))
            .await?;
        Ok(rank_by_distance(lat, lon, candidates, max_km))
    }

    async fn detail_with_status(
        &self,
        event: SportEvent,
        my_status: Option<ParticipantStatus>,
    ) -> CoreResult<EventDetail> {
        let participants = self
            .participants
            .list_by_status(event.id, ParticipantStatus::Confirmed)
            .await?;
        Ok(EventDetail {
            confirmed_count: participants.len() as i64,
            participants,
            my_status,
            event,
        })
    }

    async fn load(&self, event_id: Uuid) -> CoreResult<SportEvent> {
        self.events
            .find_event(event_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Event not found"))
    }

    async fn owned(&self, event_id: Uuid, owner_id: Uuid) -> CoreResult<SportEvent> {
        let event = self.load(event_id).await?;
        if !event.is_owned_by(owner_id) {
            return Err(CoreError::forbidden("Only the event owner can do this"));
        }
        Ok(event)
    }

    async fn require_pro(&self, owner_id: Uuid) -> CoreResult<()> {
        let is_pro = self
            .users
            .find_user(owner_id)
            .await?
            .is_some_and(|u| u.is_pro);
        if is_pro {
            Ok(())
        } else {
            Err(CoreError::forbidden("Only pro users can create paid events"))
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn sport_filter(sport: Option<&str>) -> Option<&str> {
    sport.map(str::trim).filter(|s| !s.is_empty())
}

fn describe(error: &validator::ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{Recurrence, User, Visibility};
    use crate::ports::InMemoryStore;
    use crate::services::notification::LoggingNotificationEmitter;
    use crate::services::participation::ParticipationLedger;
    use chrono::{Duration, NaiveTime};

    struct Fixture {
        store: Arc<InMemoryStore>,
        catalog: EventCatalog,
        ledger: ParticipationLedger,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let catalog = EventCatalog::new(store.clone(), store.clone(), store.clone());
        let ledger = ParticipationLedger::new(
            store.clone(),
            store.clone(),
            Arc::new(LoggingNotificationEmitter),
        );
        Fixture {
            store,
            catalog,
            ledger,
        }
    }

    fn request(sport: &str, coords: Option<(f64, f64)>) -> EventRequest {
        EventRequest {
            sport: sport.to_string(),
            title: None,
            description: None,
            location: None,
            latitude: coords.map(|c| c.0),
            longitude: coords.map(|c| c.1),
            date: today() + Duration::days(1),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            recurrence: Recurrence::Weekly,
            visibility: Visibility::Public,
            max_participants: None,
            is_paid: false,
            price: None,
        }
    }

    fn nearby(lat: Option<f64>, lon: Option<f64>, max: Option<f64>) -> NearbyQuery {
        NearbyQuery {
            latitude: lat,
            longitude: lon,
            max_distance: max,
            sport: None,
        }
    }

    #[tokio::test]
    async fn test_paid_event_requires_pro_owner() {
        let f = fixture();
        let regular = Uuid::new_v4();
        let pro = Uuid::new_v4();
        f.store.insert_user(User::new(regular, "Sam")).await;
        f.store.insert_user(User::new(pro, "Alex").pro()).await;

        let mut req = request("Yoga", None);
        req.is_paid = true;
        req.price = Some(15.0);

        let err = f.catalog.create(regular, req.clone()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        let event = f.catalog.create(pro, req).await.unwrap();
        assert_eq!(event.price, Some(15.0));
    }

    #[tokio::test]
    async fn test_private_event_visibility() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let mut req = request("Tennis", None);
        req.visibility = Visibility::Private;
        let event = f.catalog.create(owner, req).await.unwrap();
        let guest = Uuid::new_v4();

        assert!(f.catalog.get(event.id, Some(owner)).await.is_ok());
        let err = f.catalog.get(event.id, Some(guest)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        let err = f.catalog.get(event.id, None).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        f.ledger.join(event.id, guest).await.unwrap();
        let detail = f.catalog.get(event.id, Some(guest)).await.unwrap();
        assert_eq!(detail.my_status, Some(ParticipantStatus::Pending));
        assert_eq!(detail.confirmed_count, 0);
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_confirmed() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let mut req = request("Football", None);
        req.max_participants = Some(10);
        let event = f.catalog.create(owner, req.clone()).await.unwrap();
        for _ in 0..4 {
            f.ledger.join(event.id, Uuid::new_v4()).await.unwrap();
        }

        req.max_participants = Some(3);
        let err = f
            .catalog
            .update(event.id, owner, req.clone())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        req.max_participants = Some(4);
        let updated = f.catalog.update(event.id, owner, req).await.unwrap();
        assert_eq!(updated.max_participants, Some(4));
    }

    #[tokio::test]
    async fn test_only_owner_updates_and_deletes() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let event = f
            .catalog
            .create(owner, request("Padel", None))
            .await
            .unwrap();
        let stranger = Uuid::new_v4();

        let err = f
            .catalog
            .update(event.id, stranger, request("Padel", None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
        let err = f.catalog.delete(event.id, stranger).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);

        f.catalog.delete(event.id, owner).await.unwrap();
        let err = f.catalog.get(event.id, Some(owner)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_upcoming_hides_private_from_others() {
        let f = fixture();
        let owner = Uuid::new_v4();
        f.catalog
            .create(owner, request("Golf", None))
            .await
            .unwrap();
        let mut private = request("Golf", None);
        private.visibility = Visibility::Private;
        f.catalog.create(owner, private).await.unwrap();

        assert_eq!(f.catalog.list_upcoming(owner, owner).await.unwrap().len(), 2);
        assert_eq!(
            f.catalog
                .list_upcoming(owner, Uuid::new_v4())
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_nearby_within_ten_km_of_paris() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let near = f
            .catalog
            .create(owner, request("Running", Some((48.86, 2.36))))
            .await
            .unwrap();
        let nearer = f
            .catalog
            .create(owner, request("Running", Some((48.851, 2.351))))
            .await
            .unwrap();
        f.catalog
            .create(owner, request("Running", Some((51.5074, -0.1278))))
            .await
            .unwrap();
        f.catalog
            .create(owner, request("Running", None))
            .await
            .unwrap();

        let hits = f
            .catalog
            .search_nearby(&nearby(Some(48.85), Some(2.35), Some(10.0)))
            .await
            .unwrap();
        let ids: Vec<Uuid> = hits.iter().map(|h| h.event.id).collect();
        assert_eq!(ids, vec![nearer.id, near.id]);
        assert!(hits.iter().all(|h| h.distance_km <= 10.0));
    }

    #[tokio::test]
    async fn test_nearby_filters_sport_and_skips_private() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let tennis = f
            .catalog
            .create(owner, request("Tennis", Some((48.86, 2.36))))
            .await
            .unwrap();
        f.catalog
            .create(owner, request("Squash", Some((48.86, 2.36))))
            .await
            .unwrap();
        let mut private = request("Tennis", Some((48.86, 2.36)));
        private.visibility = Visibility::Private;
        f.catalog.create(owner, private).await.unwrap();

        let mut query = nearby(Some(48.85), Some(2.35), None);
        query.sport = Some("tennis".into());
        let hits = f.catalog.search_nearby(&query).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].event.id, tennis.id);
    }

    #[tokio::test]
    async fn test_nearby_input_errors() {
        let f = fixture();
        let err = f
            .catalog
            .search_nearby(&nearby(Some(48.85), None, None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLocation);

        let err = f
            .catalog
            .search_nearby(&nearby(Some(48.85), Some(2.35), Some(0.5)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = f
            .catalog
            .search_nearby(&nearby(Some(48.85), Some(2.35), Some(501.0)))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        let err = f
            .catalog
            .search_nearby(&nearby(Some(95.0), Some(2.35), None))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_participating_lists_confirmed_only() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let open = f
            .catalog
            .create(owner, request("Rugby", None))
            .await
            .unwrap();
        let mut req = request("Rugby", None);
        req.visibility = Visibility::Private;
        let closed = f.catalog.create(owner, req).await.unwrap();

        f.ledger.join(open.id, user).await.unwrap();
        f.ledger.join(closed.id, user).await.unwrap();

        let events = f.catalog.list_participating(user).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, open.id);
    }
}
