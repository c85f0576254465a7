//! CommentRepository - Repository per i commenti di un evento

use super::Create;
use crate::dtos::CreateCommentDTO;
use crate::entities::Comment;
use chrono::Utc;
use sqlx::{Error, SqlitePool};

const COMMENT_COLUMNS: &str = "id, event_id, user_id, content, created_at";

// COMMENT REPO
#[derive(Clone)]
pub struct CommentRepository {
    connection_pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_many_by_event_id(&self, event_id: &i64) -> Result<Vec<Comment>, Error> {
        sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE event_id = ? ORDER BY created_at, id"
        ))
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Create<Comment, CreateCommentDTO> for CommentRepository {
    async fn create(&self, data: &CreateCommentDTO) -> Result<Comment, Error> {
        sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments (event_id, user_id, content, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(data.event_id)
        .bind(data.user_id)
        .bind(&data.content)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }
}
