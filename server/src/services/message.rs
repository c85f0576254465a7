//! Message services - Messaggi diretti tra utenti

use crate::core::{AppError, AppJson, AppState};
use crate::dtos::{CreateMessageDTO, SendMessageDTO};
use crate::entities::{Message, User};
use crate::repositories::{Create, Read};
use crate::workflow::NotificationKind;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id, receiver_id = %body.receiver_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<SendMessageDTO>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    debug!("Sending direct message");
    // 1. Validare il contenuto
    // 2. Il destinatario deve esistere e non coincidere con il mittente
    // 3. Se il messaggio è legato a un gruppo, il mittente deve esserne membro
    // 4. Salvare e notificare il destinatario (fire-and-forget)
    body.validate()?;

    if body.receiver_id == current_user.id {
        return Err(AppError::bad_request("You cannot send a message to yourself"));
    }

    state
        .user
        .read(&body.receiver_id)
        .await?
        .ok_or_else(|| AppError::not_found("Receiver not found"))?;

    if let Some(group_id) = body.group_id {
        if !current_user.is_member_of(group_id) {
            warn!("Sender is not a member of group {}", group_id);
            return Err(AppError::forbidden("You are not a member of this group"));
        }
    }

    let message = state
        .msg
        .create(&CreateMessageDTO {
            sender_id: current_user.id,
            receiver_id: body.receiver_id,
            group_id: body.group_id,
            content: body.content,
        })
        .await?;

    info!("Message {} stored", message.id);

    match serde_json::to_value(&message) {
        Ok(payload) => {
            if let Err(e) = state
                .notifier
                .notify(message.receiver_id, NotificationKind::NewMessage, payload)
                .await
            {
                warn!("New message notification dropped: {}", e);
            }
        }
        Err(e) => warn!("Failed to serialize message notification: {:?}", e),
    }

    Ok((StatusCode::CREATED, Json(message)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn list_inbox(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state.msg.find_inbox(&current_user.id).await?;
    debug!("Inbox has {} messages", messages.len());
    Ok(Json(messages))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn list_sent(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state.msg.find_sent(&current_user.id).await?;
    Ok(Json(messages))
}
