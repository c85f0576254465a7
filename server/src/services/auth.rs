//! Auth services - Gestione autenticazione e registrazione utenti

use crate::core::{AppError, AppJson, AppState, encode_jwt};
use crate::dtos::{AuthResponseDTO, CreateUserDTO, LoginDTO, UserDTO};
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    debug!("Login attempt");
    // 1. Validare email e password (fail-fast prima della query DB)
    // 2. Cercare l'utente nel database tramite email
    // 3. Se l'utente non esiste o la password non corrisponde, ritornare UNAUTHORIZED
    // 4. Generare un token JWT con id, email e il segreto
    // 5. Ritornare il token nell'header Authorization e nel body
    body.validate()?;

    let user = match state.user.find_by_email(&body.email).await? {
        Some(user) => user,
        None => {
            warn!("Login with unknown email");
            return Err(AppError::unauthorized("Email or password are not correct"));
        }
    };

    if !user.verify_password(&body.password) {
        warn!("Wrong password for user {}", user.id);
        return Err(AppError::unauthorized("Email or password are not correct"));
    }

    let token = encode_jwt(user.email.clone(), user.id, &state.jwt_secret)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|e| {
            error!("Invalid token header: {:?}", e);
            AppError::internal_server_error("Failed to build token header")
        })?,
    );

    info!("User {} logged in", user.id);
    Ok((
        StatusCode::OK,
        headers,
        Json(AuthResponseDTO {
            token,
            user: UserDTO::from(user),
        }),
    ))
}

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<CreateUserDTO>, // JSON body
) -> Result<(StatusCode, Json<UserDTO>), AppError> {
    debug!("Registering new user");
    // 1. Validare il DTO con validator (nome, email, lunghezza password)
    // 2. Se esiste già un utente con la stessa email, ritornare CONFLICT
    // 3. Generare l'hash della password e salvare l'utente
    // 4. Ritornare il DTO dell'utente creato
    body.validate()?;

    if state.user.find_by_email(&body.email).await?.is_some() {
        warn!("Email already registered");
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = User::hash_password(&body.password, state.bcrypt_cost).map_err(|e| {
        error!("Failed to hash password: {:?}", e);
        AppError::internal_server_error("Failed to hash password")
    })?;

    let new_user = CreateUserDTO {
        password: password_hash,
        ..body
    };

    let created_user = state.user.create(&new_user).await?;

    info!("User {} registered", created_user.id);
    Ok((StatusCode::CREATED, Json(UserDTO::from(created_user))))
}
