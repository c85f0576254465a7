//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod mailer;
pub mod repositories;
pub mod services;
pub mod workflow;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{any, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    create_router_with_cors(state, None)
}

/// Come [`create_router`], limitando CORS all'origine indicata (se valida)
pub fn create_router_with_cors(state: Arc<AppState>, cors_origin: Option<&str>) -> Router {
    use core::authentication_middleware;
    use ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes())
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/groups", configure_group_routes(state.clone()))
        .nest("/events", configure_event_routes(state.clone()))
        .nest("/tasks", configure_task_routes(state.clone()))
        .nest("/expenses", configure_expense_routes(state.clone()))
        .nest("/messages", configure_message_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(|o| o.parse::<HeaderValue>()) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!("Invalid CORS_ORIGIN, allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}

/// Configura le routes di autenticazione (login, register)
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use services::*;
    Router::new()
        .route("/login", post(login_user))
        .route("/register", post(register_user))
}

/// Configura le routes per la gestione degli utenti
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(search_user_by_email))
        .route("/me", get(get_me).put(update_me))
        .route("/{user_id}", get(get_user_by_id))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes dei gruppi: membership, inviti, richieste ed eventi del gruppo
fn configure_group_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::{authentication_middleware, group_membership_middleware};
    use services::*;

    // Rotte che NON richiedono membership (solo autenticazione)
    let public_routes = Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/requests", get(list_pending_requests))
        .route("/invitations", get(list_my_invitations))
        .route("/requests/{request_id}/handle", put(handle_request))
        .route(
            "/{group_id}",
            get(get_group).put(rename_group).delete(delete_group),
        )
        .route("/{group_id}/requests", post(request_to_join))
        .route("/{group_id}/join", put(decide_invitation))
        .route("/{group_id}/invite", post(invite_members))
        .route("/{group_id}/leave", put(leave_group))
        .route("/{group_id}/admins/{user_id}", put(promote_admin))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono membership (autenticazione + membership middleware)
    let member_routes = Router::new()
        .route(
            "/{group_id}/events",
            get(list_group_events).post(create_event),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            group_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}

/// Configura le routes degli eventi (la membership è verificata sul gruppo dell'evento)
fn configure_event_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route(
            "/{event_id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/{event_id}/tasks", get(list_tasks).post(create_task))
        .route("/{event_id}/expenses", get(list_expenses).post(create_expense))
        .route("/{event_id}/comments", get(list_comments).post(create_comment))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

fn configure_task_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/{task_id}", put(update_task).delete(delete_task))
        .route("/{task_id}/status", put(update_task_status))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

fn configure_expense_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/{expense_id}", put(update_expense).delete(delete_expense))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

fn configure_message_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", post(send_message))
        .route("/inbox", get(list_inbox))
        .route("/sent", get(list_sent))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
