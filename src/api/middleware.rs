/// Request extractors and middleware shared by all handlers
use crate::{
    context::AppContext,
    error::{InventoryError, UnloggedFailure},
    logs::RequestInfo,
    metrics,
};
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, MatchedPath, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use std::{convert::Infallible, time::Instant};
use validator::Validate;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestInfo::new(parts.method.as_str(), parts.uri.path()))
    }
}

pub const INVALID_JSON_BODY: &str = "Invalid JSON body.";

/// JSON body that has passed its `validator` rules.
///
/// Unreadable bodies and rule failures are both rejected with 400. Parser
/// output is never echoed back; request types default missing fields so
/// that absences surface as field errors.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = InventoryError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("Rejected JSON body: {}", rejection.body_text());
                InventoryError::Validation(INVALID_JSON_BODY.to_string())
            })?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Write 500 responses that carry an [`UnloggedFailure`] to the error log
pub async fn record_server_errors(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> Response {
    let info = RequestInfo::new(req.method().as_str(), req.uri().path());
    let response = next.run(req).await;

    if let Some(failure) = response.extensions().get::<UnloggedFailure>() {
        tracing::error!(
            method = %info.method,
            path = %info.path,
            "Request failed: {}",
            failure.message
        );

        if let Err(e) = ctx
            .error_log
            .record(
                &info,
                response.status().as_u16(),
                &failure.message,
                Some(&failure.trace),
            )
            .await
        {
            tracing::error!("Failed to write error log: {}", e);
        }
    }

    response
}

/// Count requests and observe latency per matched route
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    metrics::record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}
