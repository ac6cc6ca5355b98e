//! Sport event endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    EventDetail, EventRequest, EventWithDistance, NearbyQuery, PublicEventsQuery, SportEvent,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::{OptionalUserAuth, UserAuth};

/// Create an event owned by the caller.
///
/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<EventRequest>,
) -> Result<(StatusCode, Json<SportEvent>), ApiError> {
    let event = state.services.catalog.create(auth.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// All events the caller owns, past ones included.
///
/// GET /api/v1/events/me
pub async fn list_my_events(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<SportEvent>>, ApiError> {
    Ok(Json(state.services.catalog.list_owned(auth.user_id).await?))
}

/// GET /api/v1/events/me/upcoming
pub async fn list_my_upcoming(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<SportEvent>>, ApiError> {
    let events = state
        .services
        .catalog
        .list_upcoming(auth.user_id, auth.user_id)
        .await?;
    Ok(Json(events))
}

/// Events the caller is confirmed for.
///
/// GET /api/v1/events/me/participating
pub async fn list_participating(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<SportEvent>>, ApiError> {
    Ok(Json(
        state.services.catalog.list_participating(auth.user_id).await?,
    ))
}

/// Upcoming events of another user; private ones are hidden.
///
/// GET /api/v1/events/user/:user_id
pub async fn list_user_upcoming(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<SportEvent>>, ApiError> {
    let events = state
        .services
        .catalog
        .list_upcoming(user_id, auth.user_id)
        .await?;
    Ok(Json(events))
}

/// Upcoming public events. Authentication is optional.
///
/// GET /api/v1/events/public?sport=
pub async fn list_public(
    State(state): State<AppState>,
    OptionalUserAuth(auth): OptionalUserAuth,
    Query(query): Query<PublicEventsQuery>,
) -> Result<Json<Vec<SportEvent>>, ApiError> {
    let events = state
        .services
        .catalog
        .list_public(query.sport.as_deref())
        .await?;
    tracing::debug!(
        anonymous = auth.is_none(),
        count = events.len(),
        "Listed public events"
    );
    Ok(Json(events))
}

/// GET /api/v1/events/nearby?latitude=&longitude=&max_distance=&sport=
pub async fn search_nearby(
    State(state): State<AppState>,
    _auth: UserAuth,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<EventWithDistance>>, ApiError> {
    Ok(Json(state.services.catalog.search_nearby(&query).await?))
}

/// GET /api/v1/events/:event_id
pub async fn get_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<Json<EventDetail>, ApiError> {
    Ok(Json(
        state
            .services
            .catalog
            .get(event_id, Some(auth.user_id))
            .await?,
    ))
}

/// Replace an event. Owner only.
///
/// PUT /api/v1/events/:event_id
pub async fn update_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
    Json(request): Json<EventRequest>,
) -> Result<Json<SportEvent>, ApiError> {
    let event = state
        .services
        .catalog
        .update(event_id, auth.user_id, request)
        .await?;
    Ok(Json(event))
}

/// DELETE /api/v1/events/:event_id
pub async fn delete_event(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(event_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.services.catalog.delete(event_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
