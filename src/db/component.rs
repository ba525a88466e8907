/// Component catalog models
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stocked electronic component
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Component {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub product_image: Option<String>,
    pub location_reference: Option<String>,
    pub datasheet: Option<String>,
}

/// Fields for a new component
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct NewComponent {
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub product_image: Option<String>,
    pub location_reference: Option<String>,
    pub datasheet: Option<String>,
}
