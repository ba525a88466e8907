/// Search and error log models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One catalog search
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SearchLog {
    pub id: i64,
    pub search_term: String,
    pub found: bool,
    pub component_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// One server-side failure
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ErrorLog {
    pub id: i64,
    pub path: String,
    pub method: String,
    pub status_code: i64,
    pub message: String,
    pub trace: Option<String>,
    pub created_at: DateTime<Utc>,
}
