//! WebSocket Module - Notifiche real-time verso i client
//!
//! Ogni utente autenticato apre al massimo una connessione; il server vi spinge
//! frame `{"kind": ..., "payload": ...}` per messaggi, inviti e richieste.

pub mod connection;
pub mod usermap;

pub use connection::handle_socket;
pub use usermap::{InternalSignal, UserMap};

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// intervallo minimo tra due frame letti dal client
pub const RATE_LIMITER_MILLIS: u64 = 10;
/// chiusura della connessione dopo questo tempo senza traffico dal client
pub const TIMEOUT_DURATION_SECONDS: u64 = 300;

/// Entry point per gestire richieste di upgrade WebSocket
/// Operazioni:
/// 1. Estrarre user_id dall'autenticazione JWT
/// 2. Eseguire upgrade HTTP -> WebSocket
/// 3. Passare la connessione ad handle_socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    let user_id = current_user.id;
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}
