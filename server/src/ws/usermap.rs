//! UserMap - Registro degli utenti connessi via WebSocket

use crate::workflow::{Notification, NotificationKind, NotificationSink, NotifyError};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, instrument, warn};

pub enum InternalSignal {
    Shutdown,
    Notification(Notification),
}

#[derive(Default)]
pub struct UserMap {
    users_online: DashMap<i64, UnboundedSender<InternalSignal>>,
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    #[instrument(skip(self, tx))]
    pub fn register_online(&self, user_id: i64, tx: UnboundedSender<InternalSignal>) {
        info!("Registering user {} as online", user_id);
        // una nuova connessione sostituisce la precedente
        if let Some(previous) = self.users_online.insert(user_id, tx) {
            let _ = previous.send(InternalSignal::Shutdown);
        }
        info!("Total online users: {}", self.users_online.len());
    }

    #[instrument(skip(self, tx))]
    pub fn remove_from_online(&self, user_id: &i64, tx: &UnboundedSender<InternalSignal>) {
        // rimuove solo se il canale registrato è ancora quello di questa connessione
        let removed = self
            .users_online
            .remove_if(user_id, |_, current| current.same_channel(tx));
        if removed.is_some() {
            info!("Removing user from online");
        }
    }

    #[instrument(skip(self, message))]
    pub fn send_server_message_if_online(
        &self,
        user_id: &i64,
        message: InternalSignal,
    ) -> Result<(), NotifyError> {
        let Some(entry) = self.users_online.get(user_id) else {
            debug!("User {} not online, message not sent", user_id);
            return Ok(());
        };

        entry.value().send(message).map_err(|_| {
            warn!("Failed to send message to user {}", user_id);
            NotifyError::ChannelClosed(*user_id)
        })
    }

    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    pub fn is_user_online(&self, user_id: &i64) -> bool {
        self.users_online.contains_key(user_id)
    }
}

#[async_trait]
impl NotificationSink for UserMap {
    async fn notify(
        &self,
        user_id: i64,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotifyError> {
        self.send_server_message_if_online(
            &user_id,
            InternalSignal::Notification(Notification { kind, payload }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    #[tokio::test]
    async fn online_user_receives_notification() {
        let map = UserMap::new();
        let (tx, mut rx) = unbounded_channel();
        map.register_online(1, tx);

        map.notify(1, NotificationKind::GroupInvite, json!({"groupId": 5}))
            .await
            .unwrap();

        match rx.recv().await {
            Some(InternalSignal::Notification(n)) => {
                assert_eq!(n.kind, NotificationKind::GroupInvite);
                assert_eq!(n.payload["groupId"], 5);
            }
            _ => panic!("expected a notification"),
        }
    }

    #[tokio::test]
    async fn offline_user_is_skipped_silently() {
        let map = UserMap::new();
        assert!(map.notify(9, NotificationKind::NewMessage, json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn closed_channel_is_reported() {
        let map = UserMap::new();
        let (tx, rx) = unbounded_channel();
        map.register_online(2, tx);
        drop(rx);

        let result = map.notify(2, NotificationKind::NewMessage, json!({})).await;
        assert!(matches!(result, Err(NotifyError::ChannelClosed(2))));
    }

    #[test]
    fn stale_connection_does_not_unregister_the_new_one() {
        let map = UserMap::new();
        let (old_tx, _old_rx) = unbounded_channel();
        let (new_tx, _new_rx) = unbounded_channel();

        map.register_online(3, old_tx.clone());
        map.register_online(3, new_tx.clone());
        map.remove_from_online(&3, &old_tx);
        assert!(map.is_user_online(&3));

        map.remove_from_online(&3, &new_tx);
        assert!(!map.is_user_online(&3));
        assert_eq!(map.online_count(), 0);
    }
}
