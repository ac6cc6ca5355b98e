//! Sport event repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::models::{EventDraft, SportEvent};
use domain::ports::{EventStore, EventUpdate, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{RecurrenceDb, SportEventEntity, VisibilityDb};
use crate::metrics::QueryTimer;

/// Repository for sport_events.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn insert_event(&self, owner_id: Uuid, draft: &EventDraft) -> StoreResult<SportEvent> {
        let timer = QueryTimer::new("insert_event");
        let result = sqlx::query_as::<_, SportEventEntity>(
            r#"
            INSERT INTO sport_events (
                id, owner_id, sport, title, description, location, latitude, longitude,
                event_date, start_time, end_time, recurrence, visibility, max_participants,
                is_paid, price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING id, owner_id, sport, title, description, location, latitude, longitude,
                      event_date, start_time, end_time, recurrence, visibility, max_participants,
                      is_paid, price, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(&draft.sport)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.location)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(draft.date)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(RecurrenceDb::from(draft.recurrence))
        .bind(VisibilityDb::from(draft.visibility))
        .bind(draft.max_participants)
        .bind(draft.is_paid)
        .bind(draft.price)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into())
    }

    async fn find_event(&self, event_id: Uuid) -> StoreResult<Option<SportEvent>> {
        let timer = QueryTimer::new("find_event");
        let result = sqlx::query_as::<_, SportEventEntity>(
            r#"
            SELECT id, owner_id, sport, title, description, location, latitude, longitude,
                   event_date, start_time, end_time, recurrence, visibility, max_participants,
                   is_paid, price, created_at, updated_at
            FROM sport_events
            WHERE id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn update_event(&self, event_id: Uuid, draft: &EventDraft) -> StoreResult<EventUpdate> {
        let timer = QueryTimer::new("update_event");
        let mut tx = self.pool.begin().await?;

        // Same row lock as join/confirm, so capacity and confirmed count
        // cannot move between the check and the write.
        let locked: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM sport_events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(EventUpdate::Missing);
        }

        if let Some(cap) = draft.max_participants {
            let confirmed: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM event_participants WHERE event_id = $1 AND status = 'confirmed'",
            )
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;
            if confirmed > i64::from(cap) {
                return Ok(EventUpdate::BelowConfirmed { confirmed });
            }
        }

        let event = sqlx::query_as::<_, SportEventEntity>(
            r#"
            UPDATE sport_events
            SET sport = $2, title = $3, description = $4, location = $5, latitude = $6,
                longitude = $7, event_date = $8, start_time = $9, end_time = $10,
                recurrence = $11, visibility = $12, max_participants = $13, is_paid = $14,
                price = $15, updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, sport, title, description, location, latitude, longitude,
                      event_date, start_time, end_time, recurrence, visibility, max_participants,
                      is_paid, price, created_at, updated_at
            "#,
        )
        .bind(event_id)
        .bind(&draft.sport)
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.location)
        .bind(draft.latitude)
        .bind(draft.longitude)
        .bind(draft.date)
        .bind(draft.start_time)
        .bind(draft.end_time)
        .bind(RecurrenceDb::from(draft.recurrence))
        .bind(VisibilityDb::from(draft.visibility))
        .bind(draft.max_participants)
        .bind(draft.is_paid)
        .bind(draft.price)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(EventUpdate::Updated(event.into()))
    }

    async fn delete_event(&self, event_id: Uuid) -> StoreResult<bool> {
        let timer = QueryTimer::new("delete_event");
        let result = sqlx::query("DELETE FROM sport_events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await;
        timer.finish(&result);
        Ok(result?.rows_affected() > 0)
    }

    async fn list_public(
        &self,
        from: NaiveDate,
        sport: Option<&str>,
    ) -> StoreResult<Vec<SportEvent>> {
        let timer = QueryTimer::new("list_public_events");
        let result = sqlx::query_as::<_, SportEventEntity>(
            r#"
            SELECT id, owner_id, sport, title, description, location, latitude, longitude,
                   event_date, start_time, end_time, recurrence, visibility, max_participants,
                   is_paid, price, created_at, updated_at
            FROM sport_events
            WHERE visibility = 'public'
              AND event_date >= $1
              AND ($2::text IS NULL OR LOWER(sport) = LOWER($2))
            ORDER BY event_date, start_time, created_at
            "#,
        )
        .bind(from)
        .bind(sport)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        from: Option<NaiveDate>,
    ) -> StoreResult<Vec<SportEvent>> {
        let timer = QueryTimer::new("list_events_by_owner");
        let result = sqlx::query_as::<_, SportEventEntity>(
            r#"
            SELECT id, owner_id, sport, title, description, location, latitude, longitude,
                   event_date, start_time, end_time, recurrence, visibility, max_participants,
                   is_paid, price, created_at, updated_at
            FROM sport_events
            WHERE owner_id = $1
              AND ($2::date IS NULL OR event_date >= $2)
            ORDER BY event_date, start_time, created_at
            "#,
        )
        .bind(owner_id)
        .bind(from)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into_iter().map(Into::into).collect())
    }

    async fn list_confirmed_for(&self, user_id: Uuid) -> StoreResult<Vec<SportEvent>> {
        let timer = QueryTimer::new("list_events_confirmed_for_user");
        let result = sqlx::query_as::<_, SportEventEntity>(
            r#"
            SELECT e.id, e.owner_id, e.sport, e.title, e.description, e.location, e.latitude,
                   e.longitude, e.event_date, e.start_time, e.end_time, e.recurrence,
                   e.visibility, e.max_participants, e.is_paid, e.price, e.created_at,
                   e.updated_at
            FROM sport_events e
            JOIN event_participants p ON p.event_id = e.id
            WHERE p.user_id = $1 AND p.status = 'confirmed'
            ORDER BY e.event_date, e.start_time, e.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into_iter().map(Into::into).collect())
    }
}
