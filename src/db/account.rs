/// Account database models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Refresh token that was revoked by logout
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BlacklistedToken {
    pub jti: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
    pub blacklisted_at: DateTime<Utc>,
}
