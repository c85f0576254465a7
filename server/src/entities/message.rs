//! Message entity - Messaggio diretto tra due utenti, immutabile

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    // valorizzato per i messaggi informativi legati a un gruppo (esito inviti/richieste)
    pub group_id: Option<i64>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
