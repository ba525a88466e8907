use crate::{db::logs::SearchLog, error::InventoryResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// How often a term was searched
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SearchTermCount {
    pub search_term: String,
    pub count: i64,
}

/// Search log store
pub struct SearchLogManager {
    db: SqlitePool,
}

impl SearchLogManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn record(
        &self,
        term: &str,
        found: bool,
        component_id: Option<i64>,
    ) -> InventoryResult<SearchLog> {
        let entry = sqlx::query_as::<_, SearchLog>(
            r#"
            INSERT INTO search_log (search_term, found, component_id, created_at)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id, search_term, found, component_id, created_at
            "#,
        )
        .bind(term)
        .bind(found)
        .bind(component_id)
        .bind(Utc::now())
        .fetch_one(&self.db)
        .await?;

        Ok(entry)
    }

    /// Searches grouped by term, most frequent first
    pub async fn term_counts(&self, found: bool) -> InventoryResult<Vec<SearchTermCount>> {
        let counts = sqlx::query_as::<_, SearchTermCount>(
            r#"
            SELECT search_term, COUNT(*) AS count
            FROM search_log
            WHERE found = ?1
            GROUP BY search_term
            ORDER BY count DESC, search_term ASC
            "#,
        )
        .bind(found)
        .fetch_all(&self.db)
        .await?;

        Ok(counts)
    }
}
