/// Component catalog
///
/// Read side of the stock: free-text search over name and description, and
/// the low-stock report used by the dashboard.
use crate::{db::component::Component, error::InventoryResult};
#[cfg(test)]
use crate::{db::component::NewComponent, error::InventoryError};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// Component at or below the low-stock threshold
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StockAlert {
    pub id: i64,
    pub name: String,
    pub quantity: i64,
}

pub struct ComponentCatalog {
    db: SqlitePool,
}

impl ComponentCatalog {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Insert a component. Stock is managed outside this service.
    #[cfg(test)]
    pub async fn create(&self, new: NewComponent) -> InventoryResult<Component> {
        if new.quantity < 0 {
            return Err(InventoryError::Validation(
                "Quantity cannot be negative.".to_string(),
            ));
        }

        let component = sqlx::query_as::<_, Component>(
            r#"
            INSERT INTO component (name, description, quantity, product_image, location_reference, datasheet)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, name, description, quantity, product_image, location_reference, datasheet
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.quantity)
        .bind(&new.product_image)
        .bind(&new.location_reference)
        .bind(&new.datasheet)
        .fetch_one(&self.db)
        .await?;

        Ok(component)
    }

    /// Case-insensitive substring match on name or description
    pub async fn search(&self, term: &str) -> InventoryResult<Vec<Component>> {
        let pattern = format!("%{}%", escape_like(term));

        let components = sqlx::query_as::<_, Component>(
            r#"
            SELECT id, name, description, quantity, product_image, location_reference, datasheet
            FROM component
            WHERE name LIKE ?1 ESCAPE '\' OR description LIKE ?1 ESCAPE '\'
            ORDER BY id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(components)
    }

    pub async fn low_stock(&self, threshold: i64) -> InventoryResult<Vec<StockAlert>> {
        let alerts = sqlx::query_as::<_, StockAlert>(
            r#"
            SELECT id, name, quantity
            FROM component
            WHERE quantity <= ?1
            ORDER BY id
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;

        Ok(alerts)
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
