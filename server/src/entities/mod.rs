//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database.

pub mod enums;
pub mod event;
pub mod group;
pub mod group_request;
pub mod message;
pub mod user;

// Re-exports per facilitare l'import
pub use enums::{RequestKind, RequestStatus, TaskStatus};
pub use event::{Comment, Event, Expense, Task};
pub use group::Group;
pub use group_request::GroupRequest;
pub use message::Message;
pub use user::User;
