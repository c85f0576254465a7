//! Event services - Eventi del gruppo con task, spese e commenti

use crate::core::{AppError, AppJson, AppPath, AppState};
use crate::dtos::{
    CreateCommentDTO, CreateCommentRequestDTO, CreateEventDTO, CreateEventRequestDTO,
    CreateExpenseDTO, CreateExpenseRequestDTO, CreateTaskDTO, CreateTaskRequestDTO,
    UpdateEventDTO, UpdateExpenseDTO, UpdateTaskDTO, UpdateTaskRequestDTO, UpdateTaskStatusDTO,
};
use crate::entities::{Comment, Event, Expense, Group, Task, TaskStatus, User};
use crate::repositories::{Create, Delete, Read, Update};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Carica l'evento e verifica che l'utente sia membro del gruppo che lo ospita
async fn load_event_for_member(
    state: &AppState,
    event_id: i64,
    user: &User,
) -> Result<Event, AppError> {
    let event = state
        .event
        .read(&event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))?;

    if !user.is_member_of(event.group_id) {
        warn!("User {} is not a member of group {}", user.id, event.group_id);
        return Err(AppError::forbidden("You are not a member of this group"));
    }

    Ok(event)
}

/// Vero se l'utente è il proprietario della risorsa oppure admin del gruppo
async fn is_owner_or_admin(
    state: &AppState,
    owner_id: i64,
    group_id: i64,
    user: &User,
) -> Result<bool, AppError> {
    if owner_id == user.id {
        return Ok(true);
    }
    Ok(state.group.is_admin(&group_id, &user.id).await?)
}

/// L'assegnatario di un task deve esistere e far parte del gruppo dell'evento
async fn check_assignee(state: &AppState, assignee_id: i64, group_id: i64) -> Result<(), AppError> {
    let assignee = state
        .user
        .read(&assignee_id)
        .await?
        .ok_or_else(|| AppError::bad_request("Assignee does not exist"))?;
    if !assignee.is_member_of(group_id) {
        return Err(AppError::bad_request("Assignee is not a member of this group"));
    }
    Ok(())
}

fn parse_task_status(raw: &str) -> Result<TaskStatus, AppError> {
    raw.parse()
        .map_err(|_| AppError::bad_request("Status must be TODO, INPROGRESS or DONE"))
}

async fn load_task_for_member(
    state: &AppState,
    task_id: i64,
    user: &User,
) -> Result<(Task, Event), AppError> {
    let task = state
        .task
        .read(&task_id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    let event = load_event_for_member(state, task.event_id, user).await?;
    Ok((task, event))
}

async fn load_expense_for_member(
    state: &AppState,
    expense_id: i64,
    user: &User,
) -> Result<(Expense, Event), AppError> {
    let expense = state
        .expense
        .read(&expense_id)
        .await?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;
    let event = load_event_for_member(state, expense.event_id, user).await?;
    Ok((expense, event))
}

#[instrument(skip(state, current_user, group, body), fields(user_id = %current_user.id, group_id = %group.id))]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
    AppJson(body): AppJson<CreateEventRequestDTO>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    body.validate()?;

    let event = state
        .event
        .create(&CreateEventDTO {
            group_id: group.id,
            host_id: current_user.id,
            title: body.title,
            description: body.description,
            location: body.location,
            date: body.date,
        })
        .await?;

    info!("Event {} created", event.id);
    Ok((StatusCode::CREATED, Json(event)))
}

#[instrument(skip(state, group), fields(group_id = %group.id))]
pub async fn list_group_events(
    State(state): State<Arc<AppState>>,
    Extension(group): Extension<Group>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events = state.event.find_many_by_group_id(&group.id).await?;
    debug!("Found {} events", events.len());
    Ok(Json(events))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Event>, AppError> {
    let event = load_event_for_member(&state, event_id, &current_user).await?;
    Ok(Json(event))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    // 1. L'evento deve esistere e l'utente deve far parte del gruppo
    // 2. Può eliminarlo solo chi lo ospita o un admin del gruppo
    // 3. Eliminazione a cascata di task, spese e commenti
    let event = load_event_for_member(&state, event_id, &current_user).await?;

    if !is_owner_or_admin(&state, event.host_id, event.group_id, &current_user).await? {
        warn!("User {} cannot delete event {}", current_user.id, event.id);
        return Err(AppError::forbidden("Only the host or an admin can delete this event"));
    }

    state.event.delete(&event.id).await?;
    info!("Event {} deleted", event.id);
    Ok(StatusCode::OK)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<CreateTaskRequestDTO>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    body.validate()?;
    let event = load_event_for_member(&state, event_id, &current_user).await?;

    if let Some(assignee_id) = body.assigned_to {
        check_assignee(&state, assignee_id, event.group_id).await?;
    }

    let task = state
        .task
        .create(&CreateTaskDTO {
            event_id: event.id,
            title: body.title,
            created_by: current_user.id,
            assigned_to: body.assigned_to,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<Task>>, AppError> {
    let event = load_event_for_member(&state, event_id, &current_user).await?;
    let tasks = state.task.find_many_by_event_id(&event.id).await?;
    Ok(Json(tasks))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<UpdateEventDTO>,
) -> Result<Json<Event>, AppError> {
    body.validate()?;
    let event = load_event_for_member(&state, event_id, &current_user).await?;

    if !is_owner_or_admin(&state, event.host_id, event.group_id, &current_user).await? {
        warn!("User {} cannot edit event {}", current_user.id, event.id);
        return Err(AppError::forbidden("Only the host or an admin can edit this event"));
    }

    let updated = state.event.update(&event.id, &body).await?;
    info!("Event {} updated", updated.id);
    Ok(Json(updated))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    AppPath(task_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<UpdateTaskRequestDTO>,
) -> Result<Json<Task>, AppError> {
    // 1. Validazione del body e dello stato, se presente
    // 2. Il task deve appartenere a un evento del gruppo dell'utente
    // 3. Il nuovo assegnatario deve far parte dello stesso gruppo
    body.validate()?;
    let status = body.status.as_deref().map(parse_task_status).transpose()?;

    let (task, event) = load_task_for_member(&state, task_id, &current_user).await?;
    if let Some(assignee_id) = body.assigned_to {
        check_assignee(&state, assignee_id, event.group_id).await?;
    }

    let updated = state
        .task
        .update(
            &task.id,
            &UpdateTaskDTO {
                title: body.title,
                assigned_to: body.assigned_to,
                status,
            },
        )
        .await?;

    info!("Task {} updated", updated.id);
    Ok(Json(updated))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn update_task_status(
    State(state): State<Arc<AppState>>,
    AppPath(task_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<UpdateTaskStatusDTO>,
) -> Result<Json<Task>, AppError> {
    let status = parse_task_status(&body.status)?;
    let (task, _) = load_task_for_member(&state, task_id, &current_user).await?;

    let updated = state
        .task
        .update(
            &task.id,
            &UpdateTaskDTO {
                status: Some(status),
                ..Default::default()
            },
        )
        .await?;

    info!("Task {} set to {:?}", updated.id, updated.status);
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    AppPath(task_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    let (task, event) = load_task_for_member(&state, task_id, &current_user).await?;

    if !is_owner_or_admin(&state, task.created_by, event.group_id, &current_user).await? {
        warn!("User {} cannot delete task {}", current_user.id, task.id);
        return Err(AppError::forbidden("Only the creator or an admin can delete this task"));
    }

    state.task.delete(&task.id).await?;
    info!("Task {} deleted", task.id);
    Ok(StatusCode::OK)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<CreateExpenseRequestDTO>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    body.validate()?;
    let event = load_event_for_member(&state, event_id, &current_user).await?;

    let expense = state
        .expense
        .create(&CreateExpenseDTO {
            event_id: event.id,
            paid_by: current_user.id,
            amount_cents: body.amount_cents,
            description: body.description,
            paid: body.paid,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<Expense>>, AppError> {
    let event = load_event_for_member(&state, event_id, &current_user).await?;
    let expenses = state.expense.find_many_by_event_id(&event.id).await?;
    Ok(Json(expenses))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    AppPath(expense_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<UpdateExpenseDTO>,
) -> Result<Json<Expense>, AppError> {
    body.validate()?;
    let (expense, event) = load_expense_for_member(&state, expense_id, &current_user).await?;

    if !is_owner_or_admin(&state, expense.paid_by, event.group_id, &current_user).await? {
        warn!("User {} cannot edit expense {}", current_user.id, expense.id);
        return Err(AppError::forbidden("Only the payer or an admin can edit this expense"));
    }

    let updated = state.expense.update(&expense.id, &body).await?;
    info!("Expense {} updated (paid: {})", updated.id, updated.paid);
    Ok(Json(updated))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    AppPath(expense_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<StatusCode, AppError> {
    let (expense, event) = load_expense_for_member(&state, expense_id, &current_user).await?;

    if !is_owner_or_admin(&state, expense.paid_by, event.group_id, &current_user).await? {
        warn!("User {} cannot delete expense {}", current_user.id, expense.id);
        return Err(AppError::forbidden("Only the payer or an admin can delete this expense"));
    }

    state.expense.delete(&expense.id).await?;
    info!("Expense {} deleted", expense.id);
    Ok(StatusCode::OK)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
    AppJson(body): AppJson<CreateCommentRequestDTO>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    body.validate()?;
    let event = load_event_for_member(&state, event_id, &current_user).await?;

    let comment = state
        .comment
        .create(&CreateCommentDTO {
            event_id: event.id,
            user_id: current_user.id,
            content: body.content,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    AppPath(event_id): AppPath<i64>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let event = load_event_for_member(&state, event_id, &current_user).await?;
    let comments = state.comment.find_many_by_event_id(&event.id).await?;
    Ok(Json(comments))
}
