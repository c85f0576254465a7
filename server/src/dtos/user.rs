//! User DTOs - Data Transfer Objects per utenti

use crate::entities::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// struct per gestire io col client, la password non viene mai esposta
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserDTO {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub avatar: Option<String>,
    pub wallpaper: Option<String>,
    pub group_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
            phone: value.phone,
            location: value.location,
            avatar: value.avatar,
            wallpaper: value.wallpaper,
            group_id: value.group_id,
            created_at: value.created_at,
        }
    }
}

/// Versione ridotta dell'utente usata nelle liste (membri, admin, richiedenti)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDTO {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<User> for UserSummaryDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
        }
    }
}

/// DTO per creare un nuovo utente (senza id, group_id e created_at)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDTO {
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: String,

    #[validate(email(message = "Email is not valid"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub location: Option<String>,
}

/// DTO per aggiornare il profilo, solo i campi presenti vengono modificati
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDTO {
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 30, message = "Phone cannot exceed 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 100, message = "Location cannot exceed 100 characters"))]
    pub location: Option<String>,

    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,

    #[validate(url(message = "Wallpaper must be a valid URL"))]
    pub wallpaper: Option<String>,
}

impl UpdateUserDTO {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.location.is_none()
            && self.avatar.is_none()
            && self.wallpaper.is_none()
    }
}

/// DTO per il login
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct LoginDTO {
    #[validate(email(message = "Enter a valid email"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponseDTO {
    pub token: String,
    pub user: UserDTO,
}
