//! Notification - Canale di notifica verso gli utenti
//!
//! Il flusso di membership conosce solo il trait [`NotificationSink`];
//! websocket e email sono implementazioni esterne registrate nello stato.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

/// Tipo di evento notificato
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    NewMessage,
    GroupInvite,
    JoinRequest,
    RequestDecided,
    GroupDeleted,
}

/// Frame inviato al client: `{"kind": ..., "payload": ...}`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub payload: Value,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed for user {0}")]
    ChannelClosed(i64),

    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(
        &self,
        user_id: i64,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotifyError>;
}

/// Inoltra ogni notifica a tutti i sink registrati.
/// Un sink che fallisce non blocca gli altri.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self { sinks }
    }
}

#[async_trait]
impl NotificationSink for FanoutSink {
    async fn notify(
        &self,
        user_id: i64,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotifyError> {
        let mut failures = Vec::new();

        for sink in &self.sinks {
            if let Err(e) = sink.notify(user_id, kind, payload.clone()).await {
                warn!("Notification sink failed for user {}: {}", user_id, e);
                failures.push(e.to_string());
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(failures.join("; ")))
        }
    }
}

/// Sink in memoria che registra le notifiche ricevute, utile per test e job offline
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<(i64, Notification)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copia delle notifiche registrate, in ordine di emissione
    pub fn sent(&self) -> Vec<(i64, Notification)> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn sent_to(&self, user_id: i64, kind: NotificationKind) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|(id, n)| *id == user_id && n.kind == kind)
            .map(|(_, n)| n.payload)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(
        &self,
        user_id: i64,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotifyError> {
        let entry = (user_id, Notification { kind, payload });
        match self.sent.lock() {
            Ok(mut guard) => guard.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn notify(&self, user_id: i64, _: NotificationKind, _: Value) -> Result<(), NotifyError> {
            Err(NotifyError::ChannelClosed(user_id))
        }
    }

    #[tokio::test]
    async fn fanout_delivers_to_every_sink_even_when_one_fails() {
        let recorder = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new(vec![Arc::new(FailingSink), recorder.clone()]);

        let result = fanout
            .notify(7, NotificationKind::GroupInvite, json!({"groupId": 1}))
            .await;

        assert!(matches!(result, Err(NotifyError::Delivery(_))));
        assert_eq!(recorder.sent_to(7, NotificationKind::GroupInvite), vec![json!({"groupId": 1})]);
    }

    #[test]
    fn notification_frame_shape() {
        let frame = Notification {
            kind: NotificationKind::JoinRequest,
            payload: json!({"requestId": 3}),
        };
        let text = serde_json::to_string(&frame).unwrap();
        assert_eq!(text, r#"{"kind":"joinRequest","payload":{"requestId":3}}"#);
    }
}
