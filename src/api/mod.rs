/// API routes and handlers
pub mod account;
pub mod components;
pub mod dashboard;
pub mod middleware;

use crate::context::AppContext;
use axum::Router;
use serde::{Deserialize, Serialize};

/// `{"detail": ...}` body used for plain success messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(account::routes())
        .merge(components::routes())
        .merge(dashboard::routes())
}
