//! Event, Task, Expense e Comment - Risorse appartenenti a un gruppo

use super::enums::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub group_id: i64,
    pub host_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub event_id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub created_by: i64,
    pub assigned_to: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub event_id: i64,
    pub paid_by: i64,
    // importo in centesimi per evitare errori di arrotondamento
    pub amount_cents: i64,
    pub description: String,
    pub paid: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
