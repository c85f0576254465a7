//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, il flusso di membership e lo stato condiviso
//! necessario per gestire l'applicazione.

use crate::mailer::{EmailSink, Mailer};
use crate::repositories::{
    CommentRepository, EventRepository, ExpenseRepository, GroupRepository,
    GroupRequestRepository, MessageRepository, TaskRepository, UserRepository,
};
use crate::workflow::{FanoutSink, MembershipWorkflow, NotificationSink};
use crate::ws::UserMap;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    pub group: GroupRepository,

    pub request: GroupRequestRepository,

    pub event: EventRepository,

    pub task: TaskRepository,

    pub expense: ExpenseRepository,

    pub comment: CommentRepository,

    /// Repository per la gestione dei messaggi
    pub msg: MessageRepository,

    /// Flusso di membership (gruppi, inviti, richieste)
    pub membership: MembershipWorkflow,

    /// Canale di notifica condiviso da workflow e handler
    pub notifier: Arc<dyn NotificationSink>,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Costo bcrypt usato in registrazione
    pub bcrypt_cost: u32,

    /// Mappa concorrente degli utenti online con i loro canali WebSocket
    /// Key: user_id, Value: Sender per inviare notifiche al WebSocket dell'utente
    pub users_online: Arc<UserMap>,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito e la JWT secret.
    ///
    /// # Arguments
    /// * `pool` - Pool di connessioni SQLite condiviso
    /// * `jwt_secret` - Chiave segreta per la firma dei token JWT
    /// * `mailer` - Client SMTP opzionale, se presente gli inviti arrivano anche via email
    pub fn new(pool: SqlitePool, jwt_secret: String, mailer: Option<Arc<Mailer>>) -> Self {
        let users_online = Arc::new(UserMap::new());
        let user = UserRepository::new(pool.clone());

        let in_app: Arc<dyn NotificationSink> = users_online.clone();
        let mut sinks = vec![in_app];
        if let Some(mailer) = mailer {
            sinks.push(Arc::new(EmailSink::new(mailer, user.clone())));
        }
        let notifier: Arc<dyn NotificationSink> = Arc::new(FanoutSink::new(sinks));

        Self {
            user,
            group: GroupRepository::new(pool.clone()),
            request: GroupRequestRepository::new(pool.clone()),
            event: EventRepository::new(pool.clone()),
            task: TaskRepository::new(pool.clone()),
            expense: ExpenseRepository::new(pool.clone()),
            comment: CommentRepository::new(pool.clone()),
            msg: MessageRepository::new(pool.clone()),
            membership: MembershipWorkflow::new(pool, notifier.clone()),
            notifier,
            jwt_secret,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            users_online,
        }
    }

    /// Imposta il costo bcrypt (i test usano il minimo per velocità)
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }
}
