//! WebSocket Connection Management - Gestione connessioni WebSocket

use crate::AppState;
use crate::ws::usermap::InternalSignal;
use crate::ws::{RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval, timeout};
use tracing::{error, info, instrument, warn};

#[instrument(skip(ws, state))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user_id: i64) {
    info!("WebSocket connection established");

    // Dividiamo il WebSocket in due metà: sender e receiver
    let (ws_tx, ws_rx) = ws.split();

    // canale interno: le notifiche arrivano qui e il task di scrittura le inoltra
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    state.users_online.register_online(user_id, int_tx.clone());

    tokio::spawn(listen_ws(user_id, ws_rx, int_tx, state));
    tokio::spawn(write_ws(user_id, ws_tx, int_rx));
}

#[instrument(skip(websocket_tx, internal_rx))]
pub async fn write_ws(
    user_id: i64,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
) {
    info!("Write task started");

    while let Some(signal) = internal_rx.recv().await {
        match signal {
            InternalSignal::Shutdown => {
                info!("Shutdown signal received");
                break;
            }
            InternalSignal::Notification(notification) => {
                let json = match serde_json::to_string(&notification) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize notification: {:?}", e);
                        continue;
                    }
                };
                if let Err(e) = websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await {
                    warn!("Failed to push notification, closing connection: {:?}", e);
                    break;
                }
            }
        }
    }

    let _ = websocket_tx.close().await;
    info!("Write task terminated");
}

#[instrument(skip(websocket_rx, internal_tx, state))]
pub async fn listen_ws(
    user_id: i64,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    // il canale è solo in uscita: dal client accettiamo ping e chiusura
    loop {
        match timeout(timeout_duration, websocket_rx.next()).await {
            Ok(Some(Ok(msg))) => {
                rate_limiter.tick().await;
                match msg {
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    Message::Text(_) | Message::Binary(_) => {
                        warn!("Ignoring client frame on notification channel");
                    }
                    _ => {}
                }
            }
            Ok(Some(Err(e))) => {
                warn!("WebSocket error: {:?}", e);
                break;
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    // Cleanup
    info!("Cleaning up connection");
    state.users_online.remove_from_online(&user_id, &internal_tx);
    let _ = internal_tx.send(InternalSignal::Shutdown);
    info!("Listen task terminated");
}
