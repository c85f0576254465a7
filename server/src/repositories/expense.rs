//! ExpenseRepository - Repository per le spese di un evento

use super::{Create, Delete, Read, Update};
use crate::dtos::{CreateExpenseDTO, UpdateExpenseDTO};
use crate::entities::Expense;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};

const EXPENSE_COLUMNS: &str = "id, event_id, paid_by, amount_cents, description, paid, created_at";

// EXPENSE REPO
#[derive(Clone)]
pub struct ExpenseRepository {
    connection_pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_many_by_event_id(&self, event_id: &i64) -> Result<Vec<Expense>, Error> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE event_id = ? ORDER BY id"
        ))
        .bind(event_id)
        .fetch_all(&self.connection_pool)
        .await
    }
}

impl Create<Expense, CreateExpenseDTO> for ExpenseRepository {
    async fn create(&self, data: &CreateExpenseDTO) -> Result<Expense, Error> {
        sqlx::query_as::<_, Expense>(&format!(
            r#"
            INSERT INTO expenses (event_id, paid_by, amount_cents, description, paid, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {EXPENSE_COLUMNS}
            "#
        ))
        .bind(data.event_id)
        .bind(data.paid_by)
        .bind(data.amount_cents)
        .bind(&data.description)
        .bind(data.paid)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await
    }
}

impl Read<Expense, i64> for ExpenseRepository {
    async fn read(&self, id: &i64) -> Result<Option<Expense>, Error> {
        sqlx::query_as::<_, Expense>(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}

impl Update<Expense, UpdateExpenseDTO, i64> for ExpenseRepository {
    async fn update(&self, id: &i64, data: &UpdateExpenseDTO) -> Result<Expense, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.is_empty() {
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE expenses SET ");
        let mut separated = query_builder.separated(", ");
        if let Some(amount_cents) = data.amount_cents {
            separated.push("amount_cents = ");
            separated.push_bind_unseparated(amount_cents);
        }
        if let Some(ref description) = data.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(paid) = data.paid {
            separated.push("paid = ");
            separated.push_bind_unseparated(paid);
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

impl Delete<i64> for ExpenseRepository {
    async fn delete(&self, id: &i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
