/// Authentication extractors
use crate::{
    api::middleware::extract_bearer_token, context::AppContext, db::account::User,
    error::InventoryError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated context - validates the bearer access token and loads its user
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = InventoryError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or_else(|| {
            InventoryError::Authentication(
                "Authentication credentials were not provided.".to_string(),
            )
        })?;

        let user = state.account_manager.authenticate_access(&token).await?;

        tracing::debug!("Authenticated user {}", user.id);
        Ok(AuthContext { user })
    }
}
