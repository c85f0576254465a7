//! Database - Creazione del pool SQLite e applicazione delle migrazioni

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info, instrument};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Apre il pool e applica le migrazioni mancanti.
///
/// Per i database in memoria il pool viene forzato a una sola connessione senza scadenza:
/// ogni connessione SQLite `:memory:` vedrebbe un database diverso.
#[instrument(skip(url))]
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = url.contains(":memory:") || url.contains("mode=memory");

    let pool = if in_memory {
        debug!("Opening in-memory database");
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?
    };

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))?;

    info!("Database ready, migrations applied");
    Ok(pool)
}

/// Database vuoto in memoria con lo schema applicato, usato dai test
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    connect("sqlite::memory:", 1).await
}
