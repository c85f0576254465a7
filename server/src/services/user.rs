//! User services - Gestione utenti

use crate::core::{AppError, AppJson, AppPath, AppQuery, AppState};
use crate::dtos::{UpdateUserDTO, UserDTO, UserSearchQuery};
use crate::entities::User;
use crate::repositories::{Read, Update};
use axum::{
    Extension, Json,
    extract::State,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(current_user), fields(user_id = %current_user.id))]
pub async fn get_me(Extension(current_user): Extension<User>) -> Json<UserDTO> {
    Json(UserDTO::from(current_user))
}

/// Aggiorna il profilo dell'utente autenticato; i campi assenti restano invariati
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<UpdateUserDTO>,
) -> Result<Json<UserDTO>, AppError> {
    debug!("Updating profile");
    body.validate()?;

    let user = state.user.update(&current_user.id, &body).await?;
    info!("Profile updated");
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    AppPath(user_id): AppPath<i64>, // parametro dalla URL /users/{user_id}
) -> Result<Json<UserDTO>, AppError> {
    debug!("Fetching user by ID");
    let user = state.user.read(&user_id).await?.ok_or_else(|| {
        warn!("User not found");
        AppError::not_found("User not found")
    })?;

    info!("User found");
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state, params))]
pub async fn search_user_by_email(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<UserSearchQuery>, // query params /users?email=...
) -> Result<Json<UserDTO>, AppError> {
    debug!("Searching user by email");
    let user = state
        .user
        .find_by_email(&params.email)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(UserDTO::from(user)))
}
