//! Group DTOs - Data Transfer Objects per gruppi, inviti e decisioni

use crate::dtos::{GroupRequestDTO, UserSummaryDTO};
use crate::entities::Group;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    // niente spazi all'inizio o alla fine del nome
    pub static ref GROUP_NAME_RE: Regex = Regex::new(r"^[^\s](.*[^\s])?$").unwrap();
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GroupDTO {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Group> for GroupDTO {
    fn from(value: Group) -> Self {
        Self {
            id: value.id,
            name: value.name,
            created_at: value.created_at,
        }
    }
}

/// DTO per creare un gruppo, con la lista opzionale di email da invitare
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateGroupDTO {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Group name must be between 1 and 100 characters"),
        regex(path = *GROUP_NAME_RE, message = "Group name cannot start or end with whitespace")
    )]
    pub name: String,

    #[serde(default)]
    pub invites: Vec<String>,
}

/// DTO per rinominare un gruppo
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct RenameGroupDTO {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Group name must be between 1 and 100 characters"),
        regex(path = *GROUP_NAME_RE, message = "Group name cannot start or end with whitespace")
    )]
    pub name: String,
}

/// DTO per invitare nuovi membri via email
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct InviteMembersDTO {
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Provide between 1 and 50 emails"))]
    pub invites: Vec<String>,
}

/// Body per le decisioni su inviti e richieste: {status: APPROVED|REJECTED}.
/// Lo stato arriva come stringa per restituire 400 (e non 422) su valori non validi.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DecisionDTO {
    #[serde(default)]
    pub status: String,
}

/// Body per la richiesta di adesione: {userId}
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequestDTO {
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// Esito di un invio di inviti: richieste create ed email scartate
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct InvitationResultDTO {
    pub invites: Vec<GroupRequestDTO>,
    pub skipped: Vec<String>,
}

/// Risposta della creazione di un gruppo
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreatedDTO {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub invites: Vec<GroupRequestDTO>,
    pub skipped: Vec<String>,
}

impl From<(Group, InvitationResultDTO)> for GroupCreatedDTO {
    fn from(value: (Group, InvitationResultDTO)) -> Self {
        let (group, result) = value;
        Self {
            id: group.id,
            name: group.name,
            created_at: group.created_at,
            invites: result.invites,
            skipped: result.skipped,
        }
    }
}

/// Dettaglio completo di un gruppo
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetailDTO {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub admins: Vec<UserSummaryDTO>,
    pub members: Vec<UserSummaryDTO>,
    pub approved_requests: Vec<GroupRequestDTO>,
}

/// Esito dell'uscita da un gruppo
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LeaveGroupDTO {
    pub group_id: i64,
    // true se l'utente era l'ultimo membro e il gruppo è stato eliminato
    pub group_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_name_rules() {
        let ok = CreateGroupDTO { name: "Hikers".into(), invites: vec![] };
        assert!(ok.validate().is_ok());

        let empty = CreateGroupDTO { name: "".into(), invites: vec![] };
        assert!(empty.validate().is_err());

        let padded = CreateGroupDTO { name: " Hikers".into(), invites: vec![] };
        assert!(padded.validate().is_err());

        let single = CreateGroupDTO { name: "H".into(), invites: vec![] };
        assert!(single.validate().is_ok());
    }

    #[test]
    fn missing_name_deserializes_to_empty_and_fails_validation() {
        let dto: CreateGroupDTO = serde_json::from_str(r#"{"invites": ["a@x.com"]}"#).unwrap();
        assert!(dto.name.is_empty());
        assert!(dto.validate().is_err());
    }
}
