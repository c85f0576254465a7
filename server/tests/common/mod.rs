#![allow(dead_code)]

use axum_test::TestServer;
use axum_test::http::HeaderName;
use gatherly_server::core::AppState;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";

/// Crea un AppState per i test
///
/// # Arguments
/// * `pool` - Connection pool SQLite (con migrations e fixtures già applicate)
///
/// # Returns
/// Arc<AppState> con il JWT secret di test, senza mailer e con bcrypt al costo minimo
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, JWT_SECRET.to_string(), None).with_bcrypt_cost(4))
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = gatherly_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing
///
/// # Arguments
/// * `user_id` - ID dell'utente per cui generare il token
/// * `email` - Email dell'utente
/// * `jwt_secret` - Secret key per firmare il token
///
/// # Returns
/// Token JWT valido per 24 ore
pub fn create_test_jwt(user_id: i64, email: &str, jwt_secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Claims {
        id: i64,
        email: String,
        exp: usize,
        iat: usize,
    }

    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        id: user_id,
        email: email.to_string(),
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Failed to create JWT token")
}

/// Header Authorization pronto per `add_header`
pub fn auth_header(user_id: i64, email: &str) -> (HeaderName, String) {
    (
        HeaderName::from_static("authorization"),
        format!("Bearer {}", create_test_jwt(user_id, email, JWT_SECRET)),
    )
}

// utenti definiti in fixtures/users.sql
pub const ALICE: (i64, &str) = (1, "alice@x.com");
pub const BOB: (i64, &str) = (2, "bob@x.com");
pub const CHARLIE: (i64, &str) = (3, "charlie@x.com");
pub const DAVE: (i64, &str) = (4, "dave@x.com");
