//! Websocket endpoint for realtime frames.

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

/// Upgrades to a websocket after verifying the access token from the
/// `token` query parameter or the Authorization header. The socket is
/// server-push only; client text frames are ignored.
///
/// GET /ws?token=
pub async fn connect(
    State(state): State<AppState>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .or_else(|| header_token(&headers))
        .ok_or_else(|| ApiError::Unauthorized("Missing access token".to_string()))?;
    let auth = UserAuth::from_token(&state.jwt, &token)?;

    Ok(ws.on_upgrade(move |socket| serve(socket, state, auth)))
}

async fn serve(socket: WebSocket, state: AppState, auth: UserAuth) {
    let user_id = auth.user_id;
    let (connection_id, mut frames) = state.connections.register(user_id).await;
    let (mut sender, mut receiver) = socket.split();

    let mut push = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode realtime frame");
                    continue;
                }
            };
            if sender.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut read = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            if let WsMessage::Close(_) = message {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut push => read.abort(),
        _ = &mut read => push.abort(),
    }

    state.connections.unregister(user_id, connection_id).await;
}
