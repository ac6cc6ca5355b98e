//! Join, leave and owner decisions on event participation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{EventDetail, Participant};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Join an event. Public events confirm immediately, private ones queue a
/// pending request for the owner. Returns the event as the caller now sees
/// it.
///
/// POST /api/v1/events/:event_id/join
pub async fn join(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetail>, ApiError> {
    state.services.ledger.join(event_id, auth.user_id).await?;
    let detail = state.services.catalog.detail(event_id, auth.user_id).await?;
    Ok(Json(detail))
}

/// DELETE /api/v1/events/:event_id/leave
pub async fn leave(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.ledger.leave(event_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pending join requests. Owner only.
///
/// GET /api/v1/events/:event_id/participants/pending
pub async fn list_pending(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Vec<Participant>>, ApiError> {
    Ok(Json(
        state
            .services
            .ledger
            .list_pending(event_id, auth.user_id)
            .await?,
    ))
}

/// PUT /api/v1/events/:event_id/participants/:participant_id/approve
pub async fn approve(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((event_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EventDetail>, ApiError> {
    state
        .services
        .ledger
        .approve(event_id, participant_id, auth.user_id)
        .await?;
    Ok(Json(
        state.services.catalog.detail(event_id, auth.user_id).await?,
    ))
}

/// PUT /api/v1/events/:event_id/participants/:participant_id/reject
pub async fn reject(
    State(state): State<AppState>,
    auth: UserAuth,
    Path((event_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EventDetail>, ApiError> {
    state
        .services
        .ledger
        .reject(event_id, participant_id, auth.user_id)
        .await?;
    Ok(Json(
        state.services.catalog.detail(event_id, auth.user_id).await?,
    ))
}
