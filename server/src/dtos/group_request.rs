//! GroupRequest DTOs - Data Transfer Objects per inviti e richieste di adesione

use crate::dtos::{GroupDTO, UserSummaryDTO};
use crate::entities::{GroupRequest, RequestKind, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GroupRequestDTO {
    pub id: i64,
    pub user_id: i64,
    pub group_id: i64,
    pub kind: RequestKind,
    pub invited_by: Option<i64>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<GroupRequest> for GroupRequestDTO {
    fn from(value: GroupRequest) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            group_id: value.group_id,
            kind: value.kind,
            invited_by: value.invited_by,
            status: value.status,
            created_at: value.created_at,
            decided_at: value.decided_at,
        }
    }
}

/// DTO arricchito con informazioni complete del richiedente e del gruppo
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedRequestDTO {
    pub id: i64,
    pub kind: RequestKind,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub invited_by: Option<i64>,
    pub requester: Option<UserSummaryDTO>,
    pub group: Option<GroupDTO>,
}
