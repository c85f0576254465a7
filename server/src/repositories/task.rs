//! TaskRepository - Repository per i task di un evento

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateTaskDTO, UpdateTaskDTO};
use crate::entities::{Task, TaskStatus};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};

const TASK_COLUMNS: &str = "id, event_id, title, status, created_by, assigned_to, created_at";

// TASK REPO
#[derive(Clone)]
pub struct TaskRepository {
    connection_pool: SqlitePool,
}

impl TaskRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_many_by_event_id(&self, event_id: &i64) -> Result<Vec<Task>, Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE event_id = ? ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Create<Task, CreateTaskDTO> for TaskRepository {
    async fn create(&self, data: &CreateTaskDTO) -> Result<Task, Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (event_id, title, status, created_by, assigned_to, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.event_id)
        .bind(&data.title)
        .bind(TaskStatus::Todo)
        .bind(data.created_by)
        .bind(data.assigned_to)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Task, i64> for TaskRepository {
    async fn read(&self, id: &i64) -> Result<Option<Task>, Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}

impl Update<Task, UpdateTaskDTO, i64> for TaskRepository {
    async fn update(&self, id: &i64, data: &UpdateTaskDTO) -> Result<Task, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.is_empty() {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(ref title) = data.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title);
        }
        if let Some(assigned_to) = data.assigned_to {
            separated.push("assigned_to = ");
            separated.push_bind_unseparated(assigned_to);
        }
        if let Some(status) = data.status {
            separated.push("status = ");
            separated.push_bind_unseparated(status);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for TaskRepository {
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
