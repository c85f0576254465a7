//! GroupRequest entity - Invito o richiesta di adesione a un gruppo

use super::enums::{RequestKind, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequest {
    pub id: i64,
    pub user_id: i64,  // utente che entrerebbe nel gruppo
    pub group_id: i64, // gruppo di destinazione
    pub kind: RequestKind,
    pub invited_by: Option<i64>, // admin che ha invitato, solo per Invite
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}
