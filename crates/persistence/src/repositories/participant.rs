//! Event participant repository.
//!
//! Every capacity-sensitive write locks the event row first, so joins,
//! approvals and capacity edits on one event run one at a time.

use async_trait::async_trait;
use domain::models::{Participant, ParticipantStatus};
use domain::ports::{DecisionOutcome, JoinOutcome, ParticipantStore, StoreResult};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::{ParticipantEntity, ParticipantStatusDb};
use crate::metrics::QueryTimer;

/// Repository for event_participants.
#[derive(Clone)]
pub struct ParticipantRepository {
    pool: PgPool,
}

impl ParticipantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Locks the event row. Returns the capacity, or `None` if the event is gone.
async fn lock_event(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
) -> Result<Option<Option<i32>>, sqlx::Error> {
    sqlx::query_scalar("SELECT max_participants FROM sport_events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(&mut **tx)
        .await
}

async fn has_room(
    tx: &mut Transaction<'_, Postgres>,
    event_id: Uuid,
    capacity: Option<i32>,
) -> Result<bool, sqlx::Error> {
    let Some(cap) = capacity else {
        return Ok(true);
    };
    let confirmed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM event_participants WHERE event_id = $1 AND status = 'confirmed'",
    )
    .bind(event_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(confirmed < i64::from(cap))
}

#[async_trait]
impl ParticipantStore for ParticipantRepository {
    async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        status: ParticipantStatus,
    ) -> StoreResult<JoinOutcome> {
        let timer = QueryTimer::new("join_event");
        let mut tx = self.pool.begin().await?;

        let Some(capacity) = lock_event(&mut tx, event_id).await? else {
            return Ok(JoinOutcome::EventMissing);
        };

        let existing = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at
            FROM event_participants
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Participant::from);

        if let Some(current) = &existing {
            if current.status.is_active() {
                return Ok(JoinOutcome::AlreadyActive(current.clone()));
            }
            if current.status == ParticipantStatus::Declined {
                return Ok(JoinOutcome::Declined(current.clone()));
            }
        }

        if !has_room(&mut tx, event_id, capacity).await? {
            return Ok(JoinOutcome::Full);
        }

        let entity = match existing {
            Some(cancelled) => {
                sqlx::query_as::<_, ParticipantEntity>(
                    r#"
                    UPDATE event_participants
                    SET status = $2, joined_at = NOW()
                    WHERE id = $1
                    RETURNING id, event_id, user_id, status, joined_at
                    "#,
                )
                .bind(cancelled.id)
                .bind(ParticipantStatusDb::from(status))
                .fetch_one(&mut *tx)
                .await?
            }
            None => {
                sqlx::query_as::<_, ParticipantEntity>(
                    r#"
                    INSERT INTO event_participants (id, event_id, user_id, status)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, event_id, user_id, status, joined_at
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(event_id)
                .bind(user_id)
                .bind(ParticipantStatusDb::from(status))
                .fetch_one(&mut *tx)
                .await?
            }
        };

        tx.commit().await?;
        timer.record();
        Ok(JoinOutcome::Joined(entity.into()))
    }

    async fn cancel(&self, event_id: Uuid, user_id: Uuid) -> StoreResult<Option<Participant>> {
        let timer = QueryTimer::new("cancel_participation");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            UPDATE event_participants
            SET status = 'cancelled'
            WHERE event_id = $1 AND user_id = $2 AND status IN ('pending', 'confirmed')
            RETURNING id, event_id, user_id, status, joined_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn confirm(&self, participant_id: Uuid) -> StoreResult<DecisionOutcome> {
        let timer = QueryTimer::new("confirm_participant");
        let Some(event_id) = sqlx::query_scalar::<_, Uuid>(
            "SELECT event_id FROM event_participants WHERE id = $1",
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(DecisionOutcome::Missing);
        };

        let mut tx = self.pool.begin().await?;
        let Some(capacity) = lock_event(&mut tx, event_id).await? else {
            return Ok(DecisionOutcome::Missing);
        };

        // Re-read under the event lock.
        let Some(current) = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at
            FROM event_participants
            WHERE id = $1
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Participant::from) else {
            return Ok(DecisionOutcome::Missing);
        };

        if current.status != ParticipantStatus::Pending {
            return Ok(DecisionOutcome::NotPending(current));
        }
        if !has_room(&mut tx, event_id, capacity).await? {
            return Ok(DecisionOutcome::Full);
        }

        let confirmed = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            UPDATE event_participants
            SET status = 'confirmed'
            WHERE id = $1 AND status = 'pending'
            RETURNING id, event_id, user_id, status, joined_at
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(confirmed) = confirmed else {
            tx.rollback().await?;
            return Ok(match self.find_participant(participant_id).await? {
                Some(current) => DecisionOutcome::NotPending(current),
                None => DecisionOutcome::Missing,
            });
        };

        tx.commit().await?;
        timer.record();
        Ok(DecisionOutcome::Applied(confirmed.into()))
    }

    async fn decline(&self, participant_id: Uuid) -> StoreResult<DecisionOutcome> {
        let timer = QueryTimer::new("decline_participant");
        let Some(event_id) = sqlx::query_scalar::<_, Uuid>(
            "SELECT event_id FROM event_participants WHERE id = $1",
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(DecisionOutcome::Missing);
        };

        // Serialized with confirm through the event row.
        let mut tx = self.pool.begin().await?;
        if lock_event(&mut tx, event_id).await?.is_none() {
            return Ok(DecisionOutcome::Missing);
        }

        let declined = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            UPDATE event_participants
            SET status = 'declined'
            WHERE id = $1 AND status = 'pending'
            RETURNING id, event_id, user_id, status, joined_at
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&mut *tx)
        .await;
        timer.finish(&declined);

        if let Some(entity) = declined? {
            tx.commit().await?;
            return Ok(DecisionOutcome::Applied(entity.into()));
        }
        tx.rollback().await?;
        Ok(match self.find_participant(participant_id).await? {
            Some(current) => DecisionOutcome::NotPending(current),
            None => DecisionOutcome::Missing,
        })
    }

    async fn find_participant(&self, participant_id: Uuid) -> StoreResult<Option<Participant>> {
        let timer = QueryTimer::new("find_participant");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at
            FROM event_participants
            WHERE id = $1
            "#,
        )
        .bind(participant_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn find_participation(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Participant>> {
        let timer = QueryTimer::new("find_participation");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at
            FROM event_participants
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.map(Into::into))
    }

    async fn count_confirmed(&self, event_id: Uuid) -> StoreResult<i64> {
        let timer = QueryTimer::new("count_confirmed_participants");
        let result: Result<i64, sqlx::Error> = sqlx::query_scalar(
            "SELECT COUNT(*) FROM event_participants WHERE event_id = $1 AND status = 'confirmed'",
        )
        .bind(event_id)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?)
    }

    async fn list_by_status(
        &self,
        event_id: Uuid,
        status: ParticipantStatus,
    ) -> StoreResult<Vec<Participant>> {
        let timer = QueryTimer::new("list_participants_by_status");
        let result = sqlx::query_as::<_, ParticipantEntity>(
            r#"
            SELECT id, event_id, user_id, status, joined_at
            FROM event_participants
            WHERE event_id = $1 AND status = $2
            ORDER BY joined_at, id
            "#,
        )
        .bind(event_id)
        .bind(ParticipantStatusDb::from(status))
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.into_iter().map(Into::into).collect())
    }
}
