//! Workflow Module - Logica di dominio indipendente da HTTP
//!
//! - membership: ciclo di vita di gruppi, admin, membri e richieste
//! - notify: trait del canale di notifica e sink generici
//! - error: tassonomia degli errori di dominio

pub mod error;
pub mod membership;
pub mod notify;

pub use error::MembershipError;
pub use membership::{Caller, MembershipWorkflow};
pub use notify::{
    FanoutSink, Notification, NotificationKind, NotificationSink, NotifyError, RecordingSink,
};
