/// Component catalog endpoints
use crate::{
    auth::AuthContext,
    context::AppContext,
    db::component::Component,
    error::{InventoryError, InventoryResult},
    metrics,
};
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/components/search/", get(search_components))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    term: Option<String>,
}

/// Search by name or description and log the search
async fn search_components(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
    Query(params): Query<SearchParams>,
) -> InventoryResult<Json<Vec<Component>>> {
    let term = params
        .term
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            InventoryError::Validation("Query parameter 'term' is required.".to_string())
        })?;

    let results = ctx.catalog.search(&term).await?;
    let found = !results.is_empty();
    let component_id = match results.as_slice() {
        [only] => Some(only.id),
        _ => None,
    };

    ctx.search_log.record(&term, found, component_id).await?;
    metrics::record_component_search(found);
    tracing::debug!("search: {:?} matched {} components", term, results.len());

    Ok(Json(results))
}
