//! HTTP route handlers.

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::app::AppState;

pub mod events;
pub mod health;
pub mod messaging;
pub mod participation;
pub mod ws;

/// Versioned routes, mounted under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/events", post(events::create_event))
        .route("/events/me", get(events::list_my_events))
        .route("/events/me/upcoming", get(events::list_my_upcoming))
        .route("/events/me/participating", get(events::list_participating))
        .route("/events/user/:user_id", get(events::list_user_upcoming))
        .route("/events/public", get(events::list_public))
        .route("/events/nearby", get(events::search_nearby))
        .route(
            "/events/:event_id",
            get(events::get_event)
                .put(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:event_id/join", post(participation::join))
        .route(
            "/events/:event_id/leave",
            axum::routing::delete(participation::leave),
        )
        .route(
            "/events/:event_id/participants/pending",
            get(participation::list_pending),
        )
        .route(
            "/events/:event_id/participants/:participant_id/approve",
            put(participation::approve),
        )
        .route(
            "/events/:event_id/participants/:participant_id/reject",
            put(participation::reject),
        )
        .route(
            "/messaging/conversations",
            post(messaging::create_conversation).get(messaging::list_conversations),
        )
        .route(
            "/messaging/conversations/:conversation_id",
            get(messaging::get_conversation),
        )
        .route(
            "/messaging/conversations/:conversation_id/messages",
            get(messaging::list_messages),
        )
        .route(
            "/messaging/conversations/:conversation_id/read",
            post(messaging::mark_read),
        )
        .route(
            "/messaging/conversations/:conversation_id/unread",
            get(messaging::unread_count),
        )
        .route("/messaging/messages", post(messaging::send_message))
        .route(
            "/messaging/messages/:message_id",
            put(messaging::edit_message).delete(messaging::delete_message),
        )
}
