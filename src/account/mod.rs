/// Account management system
///
/// Handles user records, password hashing, login and the JWT session
/// lifecycle (issue, refresh, blacklist on logout).

mod manager;
pub mod password;
pub mod tokens;

pub use manager::AccountManager;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[serde(default)]
    pub username: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[serde(default)]
    pub password: String,
}

/// Access and refresh token pair returned by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Refresh or logout request carrying a refresh token
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    #[serde(default)]
    pub refresh: String,
}

/// New access token returned by refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access: String,
}
