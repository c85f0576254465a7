//! Message DTOs - Data Transfer Objects per messaggi

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body per inviare un messaggio diretto
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageDTO {
    pub receiver_id: i64,

    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,

    #[serde(default)]
    pub group_id: Option<i64>,
}

/// DTO per creare un nuovo messaggio (senza id e created_at)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    pub sender_id: i64,
    pub receiver_id: i64,
    pub group_id: Option<i64>,

    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
}
