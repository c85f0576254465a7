//! Group services - Endpoint HTTP del flusso di membership
//!
//! Gli handler validano l'input, costruiscono il `Caller` e delegano a `MembershipWorkflow`.

use crate::core::{AppError, AppJson, AppPath, AppState};
use crate::dtos::{
    CreateGroupDTO, DecisionDTO, EnrichedRequestDTO, GroupCreatedDTO, GroupDTO, GroupDetailDTO,
    GroupRequestDTO, InvitationResultDTO, InviteMembersDTO, JoinRequestDTO, LeaveGroupDTO,
    RenameGroupDTO,
};
use crate::entities::{RequestStatus, User};
use crate::workflow::Caller;
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

fn parse_decision(body: &DecisionDTO) -> Result<RequestStatus, AppError> {
    body.status.parse::<RequestStatus>().map_err(|e| {
        warn!("Invalid decision status: {}", e);
        AppError::bad_request("Status must be APPROVED or REJECTED")
    })
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<CreateGroupDTO>,
) -> Result<(StatusCode, Json<GroupCreatedDTO>), AppError> {
    debug!("Creating group");
    // 1. Validare nome del gruppo (obbligatorio, senza spazi ai bordi)
    // 2. Creare il gruppo con il chiamante come admin e membro
    // 3. Inviare gli inviti (le email non valide finiscono in skipped)
    body.validate()?;

    let (group, result) = state
        .membership
        .create_group(&Caller::from(&current_user), &body.name, &body.invites)
        .await?;

    info!("Group {} created with {} invites", group.id, result.invites.len());
    Ok((StatusCode::CREATED, Json(GroupCreatedDTO::from((group, result)))))
}

#[instrument(skip(state))]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupDTO>>, AppError> {
    let groups = state.group.find_all().await?;
    debug!("Found {} groups", groups.len());
    Ok(Json(groups.into_iter().map(GroupDTO::from).collect()))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn rename_group(
    State(state): State<Arc<AppState>>,
    AppPath(group_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<RenameGroupDTO>,
) -> Result<Json<GroupDTO>, AppError> {
    body.validate()?;

    let group = state
        .membership
        .rename_group(&Caller::from(&current_user), group_id, &body.name)
        .await?;

    Ok(Json(GroupDTO::from(group)))
}

#[instrument(skip(state))]
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    AppPath(group_id): AppPath<i64>,
) -> Result<Json<GroupDetailDTO>, AppError> {
    let detail = state.membership.get_group(group_id).await?;
    Ok(Json(detail))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn list_pending_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EnrichedRequestDTO>>, AppError> {
    let requests = state
        .membership
        .list_pending_requests(&Caller::from(&current_user))
        .await?;
    Ok(Json(requests))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn list_my_invitations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EnrichedRequestDTO>>, AppError> {
    let invitations = state
        .membership
        .list_my_invitations(&Caller::from(&current_user))
        .await?;
    Ok(Json(invitations))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn request_to_join(
    State(state): State<Arc<AppState>>,
    AppPath(group_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<JoinRequestDTO>,
) -> Result<(StatusCode, Json<GroupRequestDTO>), AppError> {
    debug!("Join request for group {}", group_id);
    // 1. userId obbligatorio nel body
    // 2. Un utente può chiedere l'adesione solo per sé stesso
    // 3. Delegare al workflow (404 gruppo, 409 duplicato o già membro)
    let user_id = body
        .user_id
        .ok_or_else(|| AppError::bad_request("userId is required"))?;

    if user_id != current_user.id {
        warn!("User {} tried to request for user {}", current_user.id, user_id);
        return Err(AppError::forbidden("You can only request to join for yourself"));
    }

    let request = state
        .membership
        .request_to_join(&Caller::from(&current_user), group_id)
        .await?;

    Ok((StatusCode::CREATED, Json(GroupRequestDTO::from(request))))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn decide_invitation(
    State(state): State<Arc<AppState>>,
    AppPath(group_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<DecisionDTO>,
) -> Result<Json<GroupRequestDTO>, AppError> {
    let decision = parse_decision(&body)?;

    let request = state
        .membership
        .decide_invitation(&Caller::from(&current_user), group_id, decision)
        .await?;

    info!("Invitation to group {} set to {}", group_id, request.status);
    Ok(Json(GroupRequestDTO::from(request)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn handle_request(
    State(state): State<Arc<AppState>>,
    AppPath(request_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<DecisionDTO>,
) -> Result<Json<GroupRequestDTO>, AppError> {
    let decision = parse_decision(&body)?;

    let request = state
        .membership
        .decide_request(&Caller::from(&current_user), request_id, decision)
        .await?;

    info!("Request {} set to {}", request_id, request.status);
    Ok(Json(GroupRequestDTO::from(request)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn invite_members(
    State(state): State<Arc<AppState>>,
    AppPath(group_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<InviteMembersDTO>,
) -> Result<Json<InvitationResultDTO>, AppError> {
    body.validate()?;

    let result = state
        .membership
        .invite_members(&Caller::from(&current_user), group_id, &body.invites)
        .await?;

    Ok(Json(result))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn promote_admin(
    State(state): State<Arc<AppState>>,
    AppPath((group_id, user_id)): AppPath<(i64, i64)>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    state
        .membership
        .promote_admin(&Caller::from(&current_user), group_id, user_id)
        .await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn leave_group(
    State(state): State<Arc<AppState>>,
    AppPath(group_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<Json<LeaveGroupDTO>, AppError> {
    let result = state
        .membership
        .leave_group(&Caller::from(&current_user), group_id)
        .await?;
    Ok(Json(result))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    AppPath(group_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    state
        .membership
        .delete_group(&Caller::from(&current_user), group_id)
        .await?;
    Ok(StatusCode::OK)
}
