//! Auth - Token JWT e middleware di autenticazione/membership

use crate::core::{AppError, AppState};
use crate::entities::User;
use crate::repositories::Read;
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i64,
    pub email: String,
}

#[instrument(skip(secret), fields(email = %email, id = %id))]
pub fn encode_jwt(email: String, id: i64, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(24);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        email,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map(|token| {
        info!("JWT token encoded successfully");
        token
    })
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode::<Claims>(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| {
        debug!("JWT token decoded successfully for user: {}", data.claims.id);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let auth_header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::forbidden("Empty header is not allowed")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::forbidden(
                "Please add the JWT token to the header",
            ));
        }
    };

    // formato atteso: "Bearer <token>"
    let mut header = auth_header.split_whitespace();
    let token = match (header.next(), header.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => token,
        _ => {
            warn!("Malformed authorization header");
            return Err(AppError::unauthorized("Malformed authorization header"));
        }
    };

    let token_data = decode_jwt(token, &state.jwt_secret)
        .map_err(|_| AppError::unauthorized("Unable to decode token"))?;

    // Fetch the user details from the database
    let current_user = match state.user.read(&token_data.claims.id).await? {
        Some(user) => {
            info!("User authenticated: {}", user.id);
            user
        }
        None => {
            warn!("User not found in database: {}", token_data.claims.id);
            return Err(AppError::unauthorized("You are not an authorized user"));
        }
    };
    req.extensions_mut().insert(current_user);
    // l'utente si recupera dagli handler con Extension<User>
    Ok(next.run(req).await)
}

/// Middleware che verifica che l'utente corrente sia membro del gruppo specificato
/// Estrae group_id dal path (primo segmento numerico) e inserisce il gruppo nell'Extension
#[instrument(skip(state, req, next))]
pub async fn group_membership_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running group membership middleware");
    // 1. Ottenere l'utente corrente dall'Extension (deve essere stato inserito dall'authentication_middleware)
    let current_user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthorized("User not authenticated")
        })?
        .clone();

    // 2. Estrarre group_id dal path
    let group_id: i64 = req
        .uri()
        .path()
        .split('/')
        .find_map(|segment| segment.parse::<i64>().ok())
        .ok_or_else(|| {
            warn!("Group ID not found in path: {}", req.uri().path());
            AppError::bad_request("Group ID not found in path")
        })?;

    // 3. Verificare che il gruppo esista e che l'utente ne faccia parte
    let group = state
        .group
        .read(&group_id)
        .await?
        .ok_or_else(|| AppError::not_found("Group not found"))?;

    if !current_user.is_member_of(group_id) {
        warn!("User {} is not a member of group {}", current_user.id, group_id);
        return Err(AppError::forbidden("You are not a member of this group"));
    }

    info!("User {} verified as member of group {}", current_user.id, group_id);

    // 4. Inserire il gruppo nell'Extension per uso successivo negli handler
    req.extensions_mut().insert(group);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_identity() {
        let token = encode_jwt("ada@example.com".into(), 42, "secret").unwrap();
        let data = decode_jwt(&token, "secret").unwrap();
        assert_eq!(data.claims.id, 42);
        assert_eq!(data.claims.email, "ada@example.com");
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = encode_jwt("ada@example.com".into(), 42, "secret").unwrap();
        assert!(decode_jwt(&token, "other").is_err());
    }
}
