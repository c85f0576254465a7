//! GroupRepository - Repository per gruppi, admin e membership

use super::{Delete, Read, Update};
use crate::dtos::RenameGroupDTO;
use crate::entities::Group;
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::debug;

// GROUP REPO
#[derive(Clone)]
pub struct GroupRepository {
    connection_pool: SqlitePool,
}

impl GroupRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Tutti i gruppi, in ordine di creazione
    pub async fn find_all(&self) -> Result<Vec<Group>, Error> {
        sqlx::query_as::<_, Group>("SELECT id, name, created_at FROM planning_groups ORDER BY id")
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Crea il gruppo, registra il creatore come admin e lo collega come membro,
    /// tutto in una singola transazione.
    ///
    /// # Returns
    /// * `Ok(Some(Group))` - gruppo creato
    /// * `Ok(None)` - il creatore appartiene già a un gruppo, nessuna modifica applicata
    pub async fn create_with_admin(
        &self,
        name: &str,
        creator_id: &i64,
    ) -> Result<Option<Group>, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let group = sqlx::query_as::<_, Group>(
            "INSERT INTO planning_groups (name, created_at) VALUES (?, ?) RETURNING id, name, created_at",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO group_admins (group_id, user_id) VALUES (?, ?)")
            .bind(group.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        // update condizionale: fallisce se il creatore è già membro di un altro gruppo
        let joined = sqlx::query("UPDATE users SET group_id = ? WHERE id = ? AND group_id IS NULL")
            .bind(group.id)
            .bind(creator_id)
            .execute(&mut *tx)
            .await?;

        if joined.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(group))
    }

    pub async fn is_admin(&self, group_id: &i64, user_id: &i64) -> Result<bool, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM group_admins WHERE group_id = ? AND user_id = ?",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count > 0)
    }

    pub async fn find_admin_ids(&self, group_id: &i64) -> Result<Vec<i64>, Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM group_admins WHERE group_id = ? ORDER BY user_id",
        )
        .bind(group_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Gruppi amministrati da un utente
    pub async fn find_administered_group_ids(&self, user_id: &i64) -> Result<Vec<i64>, Error> {
        sqlx::query_scalar::<_, i64>("SELECT group_id FROM group_admins WHERE user_id = ?")
            .bind(user_id)
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Aggiunge un admin. Ritorna false se l'utente era già admin del gruppo.
    pub async fn add_admin(&self, group_id: &i64, user_id: &i64) -> Result<bool, Error> {
        let result = sqlx::query(
            "INSERT INTO group_admins (group_id, user_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.connection_pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Scollega l'utente dal gruppo, rimuovendolo anche dagli admin.
    /// Ritorna false se l'utente non era membro del gruppo.
    pub async fn remove_member(&self, group_id: &i64, user_id: &i64) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query("DELETE FROM group_admins WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let detached = sqlx::query("UPDATE users SET group_id = NULL WHERE id = ? AND group_id = ?")
            .bind(user_id)
            .bind(group_id)
            .execute(&mut *tx)
            .await?;

        if detached.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

impl Read<Group, i64> for GroupRepository {
    async fn read(&self, id: &i64) -> Result<Option<Group>, Error> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, created_at FROM planning_groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(group)
    }
}

impl Update<Group, RenameGroupDTO, i64> for GroupRepository {
    /// Il nome è univoco: un nome già usato fallisce con unique violation
    async fn update(&self, id: &i64, data: &RenameGroupDTO) -> Result<Group, Error> {
        sqlx::query_as::<_, Group>(
            "UPDATE planning_groups SET name = ? WHERE id = ? RETURNING id, name, created_at",
        )
        .bind(&data.name)
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?
        .ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for GroupRepository {
    /// Eliminazione a cascata: prima i figli degli eventi (commenti, task, spese),
    /// poi eventi, messaggi, richieste, admin, scollegamento dei membri e infine il gruppo.
    /// L'ordine rispetta le foreign key; tutto avviene in una transazione.
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let mut tx = self.connection_pool.begin().await?;

        const CASCADE: [&str; 8] = [
            "DELETE FROM comments WHERE event_id IN (SELECT id FROM events WHERE group_id = ?)",
            "DELETE FROM tasks WHERE event_id IN (SELECT id FROM events WHERE group_id = ?)",
            "DELETE FROM expenses WHERE event_id IN (SELECT id FROM events WHERE group_id = ?)",
            "DELETE FROM events WHERE group_id = ?",
            "DELETE FROM messages WHERE group_id = ?",
            "DELETE FROM group_requests WHERE group_id = ?",
            "DELETE FROM group_admins WHERE group_id = ?",
            "UPDATE users SET group_id = NULL WHERE group_id = ?",
        ];

        for statement in CASCADE {
            let result = sqlx::query(statement).bind(id).execute(&mut *tx).await?;
            debug!(rows = result.rows_affected(), "{}", statement);
        }

        let deleted = sqlx::query("DELETE FROM planning_groups WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}
