/// Login, session and password reset endpoints
use crate::{
    account::{AccessTokenResponse, LoginRequest, RefreshRequest, TokenPair},
    api::{middleware::ValidatedJson, DetailResponse},
    auth::AuthContext,
    context::AppContext,
    error::InventoryResult,
    logs::RequestInfo,
    metrics,
    reset::{PasswordResetConfirm, PasswordResetRequest},
};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

/// Build account routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/auth/login/", post(login))
        .route("/auth/refresh/", post(refresh))
        .route("/auth/logout/", post(logout))
        .route("/auth/password/reset/", post(request_password_reset))
        .route("/auth/password/reset/confirm/", post(confirm_password_reset))
}

/// Exchange credentials for an access/refresh pair
async fn login(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> InventoryResult<Json<TokenPair>> {
    let result = ctx.account_manager.login(&req.username, &req.password).await;
    metrics::record_login(result.is_ok());

    let (user, tokens) = result.map_err(|e| {
        tracing::info!("login: rejected for {}: {}", req.username, e);
        e
    })?;
    tracing::info!("login: user {} logged in", user.id);

    Ok(Json(tokens))
}

async fn refresh(
    State(ctx): State<AppContext>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> InventoryResult<Json<AccessTokenResponse>> {
    let access = ctx.account_manager.refresh(&req.refresh).await?;
    Ok(Json(AccessTokenResponse { access }))
}

/// Blacklist the caller's refresh token
async fn logout(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> InventoryResult<StatusCode> {
    ctx.account_manager.logout(auth.user.id, &req.refresh).await?;
    Ok(StatusCode::RESET_CONTENT)
}

async fn request_password_reset(
    State(ctx): State<AppContext>,
    info: RequestInfo,
    ValidatedJson(req): ValidatedJson<PasswordResetRequest>,
) -> InventoryResult<Json<DetailResponse>> {
    let detail = ctx.password_reset.request_reset(&info, &req).await?;
    Ok(Json(DetailResponse::new(detail)))
}

async fn confirm_password_reset(
    State(ctx): State<AppContext>,
    info: RequestInfo,
    ValidatedJson(req): ValidatedJson<PasswordResetConfirm>,
) -> InventoryResult<Json<DetailResponse>> {
    let detail = ctx.password_reset.confirm_reset(&info, &req).await?;
    Ok(Json(DetailResponse::new(detail)))
}
