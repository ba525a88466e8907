/// Dashboard endpoint
use crate::{
    auth::AuthContext, context::AppContext, dashboard::DashboardSummary, error::InventoryResult,
};
use axum::{extract::State, routing::get, Json, Router};

pub fn routes() -> Router<AppContext> {
    Router::new().route("/dashboard/", get(dashboard))
}

async fn dashboard(
    State(ctx): State<AppContext>,
    _auth: AuthContext,
) -> InventoryResult<Json<DashboardSummary>> {
    Ok(Json(ctx.dashboard.summary().await?))
}
