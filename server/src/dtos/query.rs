//! Query DTOs - Data Transfer Objects per query di ricerca

use serde::{Deserialize, Serialize};

/// DTO per query parameters di ricerca utenti
#[derive(Serialize, Deserialize, Debug)]
pub struct UserSearchQuery {
    pub email: String,
}
