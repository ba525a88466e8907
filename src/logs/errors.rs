use crate::{db::logs::ErrorLog, error::InventoryResult, metrics};
use chrono::Utc;
use sqlx::SqlitePool;

/// Method and path of the request being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub path: String,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }
}

/// Error log store
pub struct ErrorLogManager {
    db: SqlitePool,
}

impl ErrorLogManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Record one server-side failure
    pub async fn record(
        &self,
        request: &RequestInfo,
        status_code: u16,
        message: &str,
        trace: Option<&str>,
    ) -> InventoryResult<ErrorLog> {
        let entry = sqlx::query_as::<_, ErrorLog>(
            r#"
            INSERT INTO error_log (path, method, status_code, message, trace, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, path, method, status_code, message, trace, created_at
            "#,
        )
        .bind(&request.path)
        .bind(&request.method)
        .bind(status_code as i64)
        .bind(message)
        .bind(trace)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        metrics::record_error_logged(status_code);

        Ok(entry)
    }

    /// Most recent entries first
    pub async fn recent(&self, limit: i64) -> InventoryResult<Vec<ErrorLog>> {
        let entries = sqlx::query_as::<_, ErrorLog>(
            r#"
            SELECT id, path, method, status_code, message, trace, created_at
            FROM error_log
            ORDER BY id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
