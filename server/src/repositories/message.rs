//! MessageRepository - Repository per la gestione dei messaggi diretti

use super::{Create, Read};
use crate::dtos::CreateMessageDTO;
use crate::entities::Message;
use chrono::Utc;
use sqlx::{Error, SqliteConnection, SqlitePool};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, group_id, content, created_at";

// MESSAGE REPO
#[derive(Clone)]
pub struct MessageRepository {
    connection_pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Messaggi ricevuti, dal più recente
    pub async fn find_inbox(&self, user_id: &i64) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE receiver_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Messaggi inviati, dal più recente
    pub async fn find_sent(&self, user_id: &i64) -> Result<Vec<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE sender_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

/// Inserimento su una connessione esplicita, usato anche dentro le transazioni di altri repository
pub(crate) async fn insert_message(
    conn: &mut SqliteConnection,
    data: &CreateMessageDTO,
) -> Result<Message, Error> {
    sqlx::query_as::<_, Message>(&format!(
        r#"
        INSERT INTO messages (sender_id, receiver_id, group_id, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(data.sender_id)
    .bind(data.receiver_id)
    .bind(data.group_id)
    .bind(&data.content)
    .bind(Utc::now())
    .fetch_one(conn)
    .await
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        let mut conn = self.connection_pool.acquire().await?;
        insert_message(&mut *conn, data).await
    }
}

impl Read<Message, i64> for MessageRepository {
    async fn read(&self, id: &i64) -> Result<Option<Message>, Error> {
        sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
