//! GroupRequestRepository - Repository per inviti e richieste di adesione

use super::Read;
use super::message::insert_message;
use crate::dtos::CreateMessageDTO;
use crate::entities::{GroupRequest, Message, RequestKind, RequestStatus};
use chrono::Utc;
use sqlx::{Error, SqlitePool};

const REQUEST_COLUMNS: &str =
    "id, user_id, group_id, kind, invited_by, status, created_at, decided_at";

/// Esito dell'applicazione di una decisione su una richiesta
#[derive(Debug)]
pub enum DecisionOutcome {
    /// stato aggiornato (e membership applicata se approvata)
    Applied {
        request: GroupRequest,
        note: Option<Message>,
    },
    /// la richiesta non era più PENDING: nessuna modifica
    AlreadyDecided,
    /// approvazione impossibile: l'utente appartiene già a un altro gruppo, rollback
    MemberOfAnotherGroup,
}

// GROUPREQUEST REPO
#[derive(Clone)]
pub struct GroupRequestRepository {
    connection_pool: SqlitePool,
}

impl GroupRequestRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Crea un invito PENDING solo se l'utente non appartiene a nessun gruppo
    /// e non esiste già una richiesta PENDING per la stessa coppia.
    /// Il controllo e l'inserimento avvengono nella stessa istruzione.
    ///
    /// # Returns
    /// * `Ok(Some(GroupRequest))` - invito creato
    /// * `Ok(None)` - invito non applicabile, nessuna riga inserita
    pub async fn create_invite(
        &self,
        user_id: &i64,
        group_id: &i64,
        invited_by: &i64,
    ) -> Result<Option<GroupRequest>, Error> {
        sqlx::query_as::<_, GroupRequest>(&format!(
            r#"
            INSERT INTO group_requests (user_id, group_id, kind, invited_by, status, created_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM users WHERE id = ? AND group_id IS NULL)
              AND NOT EXISTS (
                  SELECT 1 FROM group_requests
                  WHERE user_id = ? AND group_id = ? AND status = 'PENDING'
              )
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(group_id)
        .bind(RequestKind::Invite)
        .bind(invited_by)
        .bind(RequestStatus::Pending)
        .bind(Utc::now())
        .bind(user_id)
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Crea una richiesta di adesione PENDING.
    /// L'indice univoco parziale su (user_id, group_id) fa fallire con unique violation
    /// un secondo inserimento mentre il primo è ancora PENDING.
    pub async fn create_join(&self, user_id: &i64, group_id: &i64) -> Result<GroupRequest, Error> {
        sqlx::query_as::<_, GroupRequest>(&format!(
            r#"
            INSERT INTO group_requests (user_id, group_id, kind, invited_by, status, created_at)
            VALUES (?, ?, ?, NULL, ?, ?)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(group_id)
        .bind(RequestKind::Join)
        .bind(RequestStatus::Pending)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }

    /// Invito PENDING ricevuto da un utente per un gruppo
    pub async fn find_pending_invite(
        &self,
        user_id: &i64,
        group_id: &i64,
    ) -> Result<Option<GroupRequest>, Error> {
        sqlx::query_as::<_, GroupRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM group_requests
            WHERE user_id = ? AND group_id = ? AND kind = 'INVITE' AND status = 'PENDING'
            "#
        ))
        .bind(user_id)
        .bind(group_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Tutte le richieste PENDING dei gruppi amministrati da `admin_id`
    pub async fn find_pending_for_admin(&self, admin_id: &i64) -> Result<Vec<GroupRequest>, Error> {
        sqlx::query_as::<_, GroupRequest>(
            r#"
            SELECT r.id, r.user_id, r.group_id, r.kind, r.invited_by, r.status, r.created_at, r.decided_at
            FROM group_requests r
            JOIN group_admins a ON a.group_id = r.group_id
            WHERE a.user_id = ? AND r.status = 'PENDING'
            ORDER BY r.created_at, r.id
            "#,
        )
        .bind(admin_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Inviti PENDING indirizzati a un utente
    pub async fn find_pending_invites_for_user(
        &self,
        user_id: &i64,
    ) -> Result<Vec<GroupRequest>, Error> {
        sqlx::query_as::<_, GroupRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM group_requests
            WHERE user_id = ? AND kind = 'INVITE' AND status = 'PENDING'
            ORDER BY created_at, id
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn find_many_by_group_and_status(
        &self,
        group_id: &i64,
        status: &RequestStatus,
    ) -> Result<Vec<GroupRequest>, Error> {
        sqlx::query_as::<_, GroupRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM group_requests WHERE group_id = ? AND status = ? ORDER BY id"
        ))
        .bind(group_id)
        .bind(status)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Applica una decisione in modo atomico.
    ///
    /// 1. compare-and-set dello stato (`WHERE status = 'PENDING'`): una seconda decisione
    ///    concorrente trova zero righe e ottiene `AlreadyDecided`
    /// 2. se approvata, collega l'utente al gruppo solo se non appartiene ad altri gruppi
    /// 3. salva l'eventuale messaggio informativo
    ///
    /// Se un passo fallisce la transazione viene annullata e lo stato resta PENDING.
    pub async fn apply_decision(
        &self,
        request_id: &i64,
        decision: &RequestStatus,
        note: Option<&CreateMessageDTO>,
    ) -> Result<DecisionOutcome, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let updated = sqlx::query_as::<_, GroupRequest>(&format!(
            r#"
            UPDATE group_requests SET status = ?, decided_at = ?
            WHERE id = ? AND status = 'PENDING'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(decision)
        .bind(Utc::now())
        .bind(request_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(request) = updated else {
            tx.rollback().await?;
            return Ok(DecisionOutcome::AlreadyDecided);
        };

        if request.status == RequestStatus::Approved {
            let joined = sqlx::query(
                "UPDATE users SET group_id = ? WHERE id = ? AND (group_id IS NULL OR group_id = ?)",
            )
            .bind(request.group_id)
            .bind(request.user_id)
            .bind(request.group_id)
            .execute(&mut *tx)
            .await?;

            if joined.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(DecisionOutcome::MemberOfAnotherGroup);
            }
        }

        let note = match note {
            Some(data) => Some(insert_message(&mut *tx, data).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(DecisionOutcome::Applied { request, note })
    }
}

impl Read<GroupRequest, i64> for GroupRequestRepository {
    async fn read(&self, id: &i64) -> Result<Option<GroupRequest>, Error> {
        sqlx::query_as::<_, GroupRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM group_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
