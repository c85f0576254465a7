//! UserRepository - Repository per la gestione degli utenti

use super::{Create, Read, ReadMany, Update};
use crate::dtos::{CreateUserDTO, UpdateUserDTO};
use crate::entities::User;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, instrument};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password, phone, location, avatar, wallpaper, group_id, created_at";

// USER REPO
#[derive(Clone)]
pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> UserRepository {
        Self { connection_pool }
    }

    /// l'email è univoca, il confronto avviene sulla forma normalizzata (minuscolo, senza spazi)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Tutti i membri di un gruppo
    pub async fn find_many_by_group_id(&self, group_id: &i64) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE group_id = ? ORDER BY id"
        ))
        .bind(group_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    pub async fn count_members(&self, group_id: &i64) -> Result<i64, Error> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE group_id = ?")
            .bind(group_id)
            .fetch_one(&self.connection_pool)
            .await?;

        Ok(count)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Create<User, CreateUserDTO> for UserRepository {
    /// la password deve arrivare già hashata
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password, phone, location, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(normalize_email(&data.email))
        .bind(&data.password)
        .bind(&data.phone)
        .bind(&data.location)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl Read<User, i64> for UserRepository {
    async fn read(&self, id: &i64) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl ReadMany<User, i64> for UserRepository {
    async fn read_many(&self, ids: &[i64]) -> Result<Vec<User>, Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE id IN ("));
        let mut separated = query_builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let users = query_builder
            .build_query_as::<User>()
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(users)
    }
}

impl Update<User, UpdateUserDTO, i64> for UserRepository {
    #[instrument(skip(self, data), fields(user_id = %id))]
    async fn update(&self, id: &i64, data: &UpdateUserDTO) -> Result<User, Error> {
        let current = self.read(id).await?.ok_or(Error::RowNotFound)?;
        if data.is_empty() {
            debug!("No fields to update, returning current user");
            return Ok(current);
        }

        let mut query_builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query_builder.separated(", ");
        let fields = [
            ("first_name", &data.first_name),
            ("last_name", &data.last_name),
            ("phone", &data.phone),
            ("location", &data.location),
            ("avatar", &data.avatar),
            ("wallpaper", &data.wallpaper),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                separated.push(format!("{column} = "));
                separated.push_bind_unseparated(value);
            }
        }

        query_builder.push(" WHERE id = ");
        query_builder.push_bind(*id);
        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or(Error::RowNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::connect_in_memory;

    fn new_user(email: &str) -> CreateUserDTO {
        CreateUserDTO {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: "not-a-real-hash".into(),
            phone: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn email_lookup_is_normalized() {
        let pool = connect_in_memory().await.unwrap();
        let repo = UserRepository::new(pool);

        let created = repo.create(&new_user("  Ada@Example.COM ")).await.unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert!(created.group_id.is_none());

        let found = repo.find_by_email("ADA@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_by_the_database() {
        let pool = connect_in_memory().await.unwrap();
        let repo = UserRepository::new(pool);

        repo.create(&new_user("ada@example.com")).await.unwrap();
        let err = repo.create(&new_user("ada@example.com")).await.unwrap_err();
        let is_unique = err
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);
        assert!(is_unique);
    }

    #[tokio::test]
    async fn read_many_returns_only_existing_users() {
        let pool = connect_in_memory().await.unwrap();
        let repo = UserRepository::new(pool);

        let a = repo.create(&new_user("a@example.com")).await.unwrap();
        let b = repo.create(&new_user("b@example.com")).await.unwrap();

        let users = repo.read_many(&[a.id, b.id, 999]).await.unwrap();
        assert_eq!(users.len(), 2);
        assert!(repo.read_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_touches_only_given_fields() {
        let pool = connect_in_memory().await.unwrap();
        let repo = UserRepository::new(pool);
        let ada = repo.create(&new_user("ada@example.com")).await.unwrap();

        let updated = repo
            .update(
                &ada.id,
                &UpdateUserDTO {
                    location: Some("Torino".into()),
                    avatar: Some("https://cdn.example.com/ada.png".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.location.as_deref(), Some("Torino"));
        assert_eq!(updated.avatar.as_deref(), Some("https://cdn.example.com/ada.png"));
        assert!(updated.wallpaper.is_none());

        let missing = repo.update(&999, &UpdateUserDTO::default()).await;
        assert!(matches!(missing, Err(Error::RowNotFound)));
    }
}
