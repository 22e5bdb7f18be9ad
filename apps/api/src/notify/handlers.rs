use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::errors::AuthError;
use crate::auth::guard::{authorize, AuthUser};
use crate::errors::AppError;
use crate::models::message::Message;
use crate::notify::{Event, NotificationHub};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SocketParams {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub recipient_user_id: Uuid,
    pub sender_name: String,
    pub sender_email: String,
    pub subject: Option<String>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkReadRequest {
    pub message_ids: Vec<Uuid>,
}

/// GET /ws/messages?token=
///
/// The token is checked exactly as the bearer guard checks it. A rejected
/// socket is closed with the policy-violation code.
pub async fn handle_messages_socket(
    ws: WebSocketUpgrade,
    Query(params): Query<SocketParams>,
    State(state): State<AppState>,
) -> Response {
    let principal = match params.token.as_deref() {
        Some(token) => authorize(&state.tokens, state.portfolio.as_ref(), token, None).await,
        None => Err(AuthError::MissingToken),
    }
    .map_err(|e| e.to_string());

    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| async move {
        match principal {
            Ok(principal) => run_session(socket, hub, principal.user_id).await,
            Err(reason) => reject(socket, reason).await,
        }
    })
}

async fn reject(mut socket: WebSocket, reason: String) {
    warn!("Rejected WebSocket connection: {reason}");
    let _ = socket
        .send(WsMessage::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: reason.into(),
        })))
        .await;
}

async fn run_session(mut socket: WebSocket, hub: NotificationHub, user_id: Uuid) {
    let (id, mut events) = hub.connect(user_id);
    info!(
        "WebSocket connected for user {user_id} ({} open)",
        hub.connection_count(user_id)
    );

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode notification: {e}");
                        continue;
                    }
                };
                if socket.send(WsMessage::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    hub.disconnect(user_id, id);
    info!("WebSocket disconnected for user {user_id}");
}

/// POST /api/v1/messages
///
/// Open contact form. Notifies the recipient's live connections.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let sender_name = req.sender_name.trim();
    let sender_email = req.sender_email.trim();
    let content = req.content.trim();
    if sender_name.is_empty() || content.is_empty() {
        return Err(AppError::Validation(
            "sender_name and content must not be empty".into(),
        ));
    }
    if !sender_email.contains('@') {
        return Err(AppError::Validation(format!(
            "'{sender_email}' is not a valid email address"
        )));
    }
    if state
        .portfolio
        .find_user(req.recipient_user_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound("Recipient user not found".into()));
    }

    let message = Message {
        id: Uuid::new_v4(),
        recipient_user_id: req.recipient_user_id,
        sender_name: sender_name.to_string(),
        sender_email: sender_email.to_string(),
        subject: req
            .subject
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        content: content.to_string(),
        is_read: false,
        created_at: Utc::now(),
    };
    state.portfolio.create_message(&message).await?;

    let delivered = state
        .hub
        .send(message.recipient_user_id, &Event::NewMessage(message.clone()));
    info!(
        "Stored message {} for user {} ({delivered} live connections notified)",
        message.id, message.recipient_user_id
    );
    Ok((StatusCode::CREATED, Json(message)))
}

/// POST /api/v1/messages/read
pub async fn handle_mark_read(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<Value>, AppError> {
    let updated = state
        .portfolio
        .mark_messages_read(principal.user_id, &req.message_ids)
        .await?;
    state.hub.send(
        principal.user_id,
        &Event::MessagesRead {
            message_ids: updated.clone(),
        },
    );
    Ok(Json(json!({ "message_ids": updated })))
}
