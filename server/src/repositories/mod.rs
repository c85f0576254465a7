//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Ogni repository gestisce le operazioni di database per una specifica entità.

// ************************* NOTA SU SQLX ************************* //

/*
   Le query usano sqlx::query_as::<_, T> con #[derive(sqlx::FromRow)] sulle entità,
   quindi non serve un database raggiungibile in fase di compilazione.
   Lo schema vive in server/migrations e viene applicato all'avvio (vedi core::db).

   Promemoria sui metodi:
   .execute(..)        -> INSERT/UPDATE/DELETE senza RETURNING
   .fetch_optional(..) -> zero o una riga
   .fetch_one(..)      -> esattamente una riga (errore se vuoto), usalo per i COUNT
   .fetch_all(..)      -> Vec di righe

   Le operazioni che toccano più tabelle aprono una transazione con pool.begin()
   e passano `&mut *tx` alle query. Con il pool di test a connessione singola
   non fare query sul pool mentre una transazione è aperta.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod comment;
pub mod event;
pub mod expense;
pub mod group;
pub mod group_request;
pub mod message;
pub mod task;
pub mod traits;
pub mod user;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{Create, Delete, Read, ReadMany, Update};

pub use comment::CommentRepository;
pub use event::EventRepository;
pub use expense::ExpenseRepository;
pub use group::GroupRepository;
pub use group_request::{DecisionOutcome, GroupRequestRepository};
pub use message::MessageRepository;
pub use task::TaskRepository;
pub use user::UserRepository;
