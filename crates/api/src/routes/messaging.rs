//! Conversation and message endpoint handlers.
//!
//! After a successful write the other members of the conversation get a
//! realtime frame if they are connected.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    Conversation, ConversationSummary, CreateConversationRequest, EditMessageRequest,
    MarkReadResult, Message, MessagesQuery, SendMessageRequest, UnreadCount,
};
use shared::pagination::{Page, PageRequest};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::realtime::{Frame, MessagesRead};

async fn fan_out(state: &AppState, conversation_id: Uuid, actor: Uuid, frame: Frame) {
    match state
        .services
        .conversations
        .assert_member(conversation_id, actor)
        .await
    {
        Ok(conversation) => {
            state
                .connections
                .fan_out(&conversation.member_ids, actor, frame)
                .await
        }
        Err(e) => tracing::warn!(
            conversation_id = %conversation_id,
            error = %e,
            "Skipped realtime fan-out"
        ),
    }
}

/// Start a private conversation with a friend (returning the existing one
/// if there is one) or create a group.
///
/// POST /api/v1/messaging/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateConversationRequest>,
) -> Result<Json<Conversation>, ApiError> {
    let conversation = state
        .services
        .conversations
        .create(auth.user_id, request)
        .await?;
    Ok(Json(conversation))
}

/// GET /api/v1/messaging/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    Ok(Json(
        state
            .services
            .conversations
            .list_for_user(auth.user_id)
            .await?,
    ))
}

/// GET /api/v1/messaging/conversations/:conversation_id
pub async fn get_conversation(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ConversationSummary>, ApiError> {
    Ok(Json(
        state
            .services
            .conversations
            .get(conversation_id, auth.user_id)
            .await?,
    ))
}

/// Newest first, deleted messages included as tombstones.
///
/// GET /api/v1/messaging/conversations/:conversation_id/messages?page=&size=
pub async fn list_messages(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(conversation_id): Path<Uuid>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Page<Message>>, ApiError> {
    let page = state
        .services
        .messages
        .list(
            conversation_id,
            auth.user_id,
            PageRequest::new(query.page, query.size),
        )
        .await?;
    Ok(Json(page))
}

/// POST /api/v1/messaging/conversations/:conversation_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<MarkReadResult>, ApiError> {
    let marked = state
        .services
        .messages
        .mark_all_read(conversation_id, auth.user_id)
        .await?;

    if marked > 0 {
        let frame = Frame::MessagesRead(MessagesRead {
            conversation_id,
            user_id: auth.user_id,
            marked,
        });
        fan_out(&state, conversation_id, auth.user_id, frame).await;
    }

    Ok(Json(MarkReadResult {
        conversation_id,
        marked,
    }))
}

/// GET /api/v1/messaging/conversations/:conversation_id/unread
pub async fn unread_count(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<UnreadCount>, ApiError> {
    let unread_count = state
        .services
        .messages
        .count_unread(conversation_id, auth.user_id)
        .await?;
    Ok(Json(UnreadCount {
        conversation_id,
        unread_count,
    }))
}

/// POST /api/v1/messaging/messages
pub async fn send_message(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    request.validate()?;
    let message = state
        .services
        .messages
        .send(
            request.conversation_id,
            auth.user_id,
            &request.content,
            request.message_type,
        )
        .await?;

    fan_out(
        &state,
        message.conversation_id,
        auth.user_id,
        Frame::NewMessage(message.clone()),
    )
    .await;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PUT /api/v1/messaging/messages/:message_id
pub async fn edit_message(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(message_id): Path<Uuid>,
    Json(request): Json<EditMessageRequest>,
) -> Result<Json<Message>, ApiError> {
    request.validate()?;
    let message = state
        .services
        .messages
        .edit(message_id, auth.user_id, &request.content)
        .await?;

    fan_out(
        &state,
        message.conversation_id,
        auth.user_id,
        Frame::MessageUpdated(message.clone()),
    )
    .await;
    Ok(Json(message))
}

/// Soft delete; the message stays in history as a tombstone.
///
/// DELETE /api/v1/messaging/messages/:message_id
pub async fn delete_message(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(message_id): Path<Uuid>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .services
        .messages
        .delete(message_id, auth.user_id)
        .await?;

    fan_out(
        &state,
        message.conversation_id,
        auth.user_id,
        Frame::MessageUpdated(message.clone()),
    )
    .await;
    Ok(Json(message))
}
