//! Event DTOs - Data Transfer Objects per eventi, task, spese e commenti

use crate::entities::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body per creare un evento in un gruppo
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateEventRequestDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub date: DateTime<Utc>,
}

/// DTO per creare un evento (campi decisi dal server inclusi)
#[derive(Debug, Clone)]
pub struct CreateEventDTO {
    pub group_id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: DateTime<Utc>,
}

/// Modifica parziale di un evento (solo host o admin)
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateEventDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl UpdateEventDTO {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.date.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequestDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    pub assigned_to: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CreateTaskDTO {
    pub event_id: i64,
    pub title: String,
    pub created_by: i64,
    pub assigned_to: Option<i64>,
}

/// Body per modificare un task: titolo, assegnatario e stato opzionali
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequestDTO {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    pub assigned_to: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskDTO {
    pub title: Option<String>,
    pub assigned_to: Option<i64>,
    pub status: Option<TaskStatus>,
}

impl UpdateTaskDTO {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.assigned_to.is_none() && self.status.is_none()
    }
}

/// Body per aggiornare lo stato di un task: {status: TODO|INPROGRESS|DONE}
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UpdateTaskStatusDTO {
    #[serde(default)]
    pub status: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequestDTO {
    #[validate(range(min = 0, message = "Amount cannot be negative"))]
    pub amount_cents: i64,
    #[validate(length(min = 1, max = 500, message = "Description must be between 1 and 500 characters"))]
    pub description: String,
    #[serde(default)]
    pub paid: bool,
}

/// Modifica parziale di una spesa, ad esempio per segnarla come pagata
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseDTO {
    #[validate(range(min = 0, message = "Amount cannot be negative"))]
    pub amount_cents: Option<i64>,
    #[validate(length(min = 1, max = 500, message = "Description must be between 1 and 500 characters"))]
    pub description: Option<String>,
    pub paid: Option<bool>,
}

impl UpdateExpenseDTO {
    pub fn is_empty(&self) -> bool {
        self.amount_cents.is_none() && self.description.is_none() && self.paid.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct CreateExpenseDTO {
    pub event_id: i64,
    pub paid_by: i64,
    pub amount_cents: i64,
    pub description: String,
    pub paid: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateCommentRequestDTO {
    #[validate(length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct CreateCommentDTO {
    pub event_id: i64,
    pub user_id: i64,
    pub content: String,
}
