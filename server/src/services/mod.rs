//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod auth;
pub mod event;
pub mod group;
pub mod message;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{login_user, register_user};
pub use event::{
    create_comment, create_event, create_expense, create_task, delete_event, delete_expense,
    delete_task, get_event, list_comments, list_expenses, list_group_events, list_tasks,
    update_event, update_expense, update_task, update_task_status,
};
pub use group::{
    create_group, decide_invitation, delete_group, get_group, handle_request, invite_members,
    leave_group, list_groups, list_my_invitations, list_pending_requests, promote_admin,
    rename_group, request_to_join,
};
pub use message::{list_inbox, list_sent, send_message};
pub use user::{get_me, get_user_by_id, search_user_by_email, update_me};

use axum::{http::StatusCode, response::IntoResponse};

/// Root endpoint - health check
pub async fn root() -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
