//! Core Module - Componenti infrastrutturali dell'applicazione
//!
//! Questo modulo contiene tutti i componenti "core" dell'applicazione:
//! - Autenticazione e JWT
//! - Configurazione
//! - Connessione al database e migrazioni
//! - Gestione errori ed extractor con rifiuti uniformi
//! - Stato applicazione

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod state;

// Re-exports per facilitare l'import
pub use auth::{
    Claims, authentication_middleware, decode_jwt, encode_jwt, group_membership_middleware,
};
pub use config::Config;
pub use error::AppError;
pub use extract::{AppJson, AppPath, AppQuery};
pub use state::AppState;
