//! MembershipError - Errori di dominio del flusso di membership

use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MembershipError {
    /// input mancante o malformato
    #[error("validation error: {0}")]
    Validation(&'static str),

    /// il chiamante non ha i diritti richiesti (admin o membro)
    #[error("not authorized: {0}")]
    Authorization(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    /// richiesta duplicata, decisione su una richiesta già chiusa, vincolo di gruppo unico
    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for MembershipError {
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = err
            .as_database_error()
            .map(|db| db.is_unique_violation())
            .unwrap_or(false);

        if unique_violation {
            return Self::Conflict("Resource already exists");
        }

        error!("Data store failure: {:?}", err);
        Self::Internal(err.to_string())
    }
}
