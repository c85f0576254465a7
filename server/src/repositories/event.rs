//! EventRepository - Repository per gli eventi di un gruppo

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateEventDTO, UpdateEventDTO};
use crate::entities::Event;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};

const EVENT_COLUMNS: &str = "id, group_id, host_id, title, description, location, date, created_at";

// EVENT REPO
#[derive(Clone)]
pub struct EventRepository {
    connection_pool: SqlitePool,
}

impl EventRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Eventi di un gruppo ordinati per data
    pub async fn find_many_by_group_id(&self, group_id: &i64) -> Result<Vec<Event>, Error> {
        sqlx::query_as::<_, Event>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE group_id = ? ORDER BY date, id"
        ))
        .bind(group_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Create<Event, CreateEventDTO> for EventRepository {
    async fn create(&self, data: &CreateEventDTO) -> Result<Event, Error> {
        sqlx::query_as::<_, Event>(&format!(
            r#"
            INSERT INTO events (group_id, host_id, title, description, location, date, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(data.group_id)
        .bind(data.host_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.location)
        .bind(data.date)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Event, i64> for EventRepository {
    async fn read(&self, id: &i64) -> Result<Option<Event>, Error> {
        sqlx::query_as::<_, Event>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Event, UpdateEventDTO, i64> for EventRepository {
    async fn update(&self, id: &i64, data: &UpdateEventDTO) -> Result<Event, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.is_empty() {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE events SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref title) = data.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(ref description) = data.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(ref location) = data.location {
            separated.push("location = ");
            separated.push_bind_unseparated(location);
        }
        if let Some(date) = data.date {
            separated.push("date = ");
            separated.push_bind_unseparated(date);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for EventRepository {
    /// Elimina l'evento insieme a task, spese e commenti collegati
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        for table in ["tasks", "expenses", "comments"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE event_id = ?"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}
