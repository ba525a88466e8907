/// HTTP server setup and routing
use crate::{
    api::middleware::{record_server_errors, track_metrics},
    context::AppContext,
    db,
    error::{InventoryError, InventoryResult},
    metrics,
};
use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .merge(crate::api::routes())
        .route_layer(middleware::from_fn(track_metrics))
        .with_state(ctx.clone())
        .layer(middleware::from_fn_with_state(ctx, record_server_errors))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

/// Liveness plus a database round trip
async fn health_check(State(ctx): State<AppContext>) -> (StatusCode, Json<serde_json::Value>) {
    match db::test_connection(&ctx.db).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
    }
}

/// Prometheus scrape endpoint
async fn metrics_handler() -> InventoryResult<impl IntoResponse> {
    let body = metrics::render_metrics()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}

async fn not_found() -> InventoryError {
    InventoryError::NotFound("Not found.".to_string())
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> InventoryResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| InventoryError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    info!("Eletro Rápida inventory service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| InventoryError::Internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::component::NewComponent,
        mailer::RecordingMailer,
        reset::{token::encode_uid, RESET_CONFIRMED, RESET_EMAIL_SENT, RESET_SEND_FAILED},
    };
    use axum::{
        body::{to_bytes, Body},
        http::Request,
        response::Response,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn setup(mailer: RecordingMailer) -> (AppContext, Arc<RecordingMailer>) {
        let mailer = Arc::new(mailer);
        let ctx = AppContext::for_tests(mailer.clone()).await;
        ctx.account_manager
            .create_user("u1", "a@x.com", "oldpass1", false)
            .await
            .unwrap();
        (ctx, mailer)
    }

    async fn send(ctx: &AppContext, request: Request<Body>) -> Response {
        build_router(ctx.clone()).oneshot(request).await.unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_token(uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn access_token(ctx: &AppContext) -> String {
        let response = send(
            ctx,
            post_json("/auth/login/", json!({"username": "u1", "password": "oldpass1"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["access"].as_str().unwrap().to_string()
    }

    fn link_params(body: &str) -> (String, String) {
        let link = body
            .lines()
            .find(|l| l.contains("/reset-password?"))
            .unwrap();
        let query = link.split_once('?').unwrap().1;
        let params: std::collections::HashMap<String, String> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), urlencoding::decode(v).unwrap().into_owned()))
            .collect();
        (params["uid"].clone(), params["token"].clone())
    }

    #[tokio::test]
    async fn test_health() {
        let (ctx, _) = setup(RecordingMailer::default()).await;
        let response = send(
            &ctx,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_reset_then_confirm_then_login() {
        let (ctx, mailer) = setup(RecordingMailer::default()).await;

        let response = send(
            &ctx,
            post_json("/auth/password/reset/", json!({"email": "a@x.com"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["detail"], RESET_EMAIL_SENT);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        let (uid, token) = link_params(&sent[0].body);

        let confirm = json!({"uid": uid, "token": token, "new_password": "newpass123"});
        let response = send(&ctx, post_json("/auth/password/reset/confirm/", confirm.clone())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["detail"], RESET_CONFIRMED);

        // Same link again
        let response = send(&ctx, post_json("/auth/password/reset/confirm/", confirm)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Token expired or invalid.");

        let response = send(
            &ctx,
            post_json("/auth/login/", json!({"username": "u1", "password": "newpass123"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(
            &ctx,
            post_json("/auth/login/", json!({"username": "u1", "password": "oldpass1"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_email_gets_identical_response() {
        let (ctx, mailer) = setup(RecordingMailer::default()).await;

        let known = send(
            &ctx,
            post_json("/auth/password/reset/", json!({"email": "a@x.com"})),
        )
        .await;
        let unknown = send(
            &ctx,
            post_json("/auth/password/reset/", json!({"email": "ghost@x.com"})),
        )
        .await;

        assert_eq!(known.status(), unknown.status());
        assert_eq!(body_bytes(known).await, body_bytes(unknown).await);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_request_validation() {
        let (ctx, mailer) = setup(RecordingMailer::default()).await;

        let response = send(
            &ctx,
            post_json("/auth/password/reset/", json!({"email": "not-an-email"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"]["email"].is_array());

        let response = send(&ctx, post_json("/auth/password/reset/", json!({}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"]["email"]
            .as_array()
            .unwrap()
            .contains(&json!("This field is required.")));
        assert!(!body["detail"].as_str().unwrap().contains("deserialize"));

        let response = send(&ctx, post_json("/auth/password/reset/", json!({"email": 5}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Invalid JSON body.");
        assert!(body.get("errors").is_none());

        let malformed = Request::builder()
            .method("POST")
            .uri("/auth/password/reset/")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = send(&ctx, malformed).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Invalid JSON body.");

        let response = send(
            &ctx,
            post_json(
                "/auth/password/reset/confirm/",
                json!({"uid": "MQ", "token": "x-00"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"]["new_password"].is_array());
        assert!(!body["detail"].as_str().unwrap().contains("missing field"));

        let response = send(&ctx, post_json("/auth/login/", json!({"username": "u1"}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["errors"]["password"].is_array());

        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_confirm_rejections() {
        let (ctx, _) = setup(RecordingMailer::default()).await;

        let response = send(
            &ctx,
            post_json(
                "/auth/password/reset/confirm/",
                json!({"uid": "bad-uid", "token": "t", "new_password": "newpass123"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Invalid token.");

        let response = send(
            &ctx,
            post_json(
                "/auth/password/reset/confirm/",
                json!({"uid": encode_uid(1), "token": "bad-token", "new_password": "newpass123"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "Token expired or invalid.");

        let response = send(
            &ctx,
            post_json(
                "/auth/password/reset/confirm/",
                json!({"uid": "bad-uid", "token": "t", "new_password": "12345"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["errors"]["new_password"].is_array());
    }

    #[tokio::test]
    async fn test_send_failure_returns_500_and_logs_once() {
        let (ctx, _) = setup(RecordingMailer::failing()).await;

        let response = send(
            &ctx,
            post_json("/auth/password/reset/", json!({"email": "a@x.com"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["detail"], RESET_SEND_FAILED);
        assert!(!body.to_string().contains("connection refused"));

        let entries = ctx.error_log.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/auth/password/reset/");
        assert_eq!(entries[0].method, "POST");
        assert_eq!(entries[0].status_code, 500);
    }

    #[tokio::test]
    async fn test_unexpected_failure_is_logged_by_middleware() {
        let (ctx, _) = setup(RecordingMailer::default()).await;
        let token = access_token(&ctx).await;

        sqlx::query("DROP TABLE search_log")
            .execute(&ctx.db)
            .await
            .unwrap();

        let response = send(&ctx, get_with_token("/components/search/?term=led", &token)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["detail"], "Internal server error.");

        let entries = ctx.error_log.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "/components/search/");
        assert_eq!(entries[0].method, "GET");
        assert!(entries[0].message.contains("search_log"));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let (ctx, _) = setup(RecordingMailer::default()).await;

        let response = send(
            &ctx,
            post_json("/auth/login/", json!({"username": "u1", "password": "oldpass1"})),
        )
        .await;
        let tokens = body_json(response).await;
        let access = tokens["access"].as_str().unwrap().to_string();
        let refresh = tokens["refresh"].as_str().unwrap().to_string();

        let response = send(&ctx, post_json("/auth/refresh/", json!({"refresh": refresh}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["access"].is_string());

        // Logout needs the access token
        let response = send(&ctx, post_json("/auth/logout/", json!({"refresh": refresh}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let logout = Request::builder()
            .method("POST")
            .uri("/auth/logout/")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", access))
            .body(Body::from(json!({"refresh": refresh}).to_string()))
            .unwrap();
        let response = send(&ctx, logout).await;
        assert_eq!(response.status(), StatusCode::RESET_CONTENT);
        assert!(body_bytes(response).await.is_empty());

        let response = send(&ctx, post_json("/auth/refresh/", json!({"refresh": refresh}))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_failure_message() {
        let (ctx, _) = setup(RecordingMailer::default()).await;
        let response = send(
            &ctx,
            post_json("/auth/login/", json!({"username": "u1", "password": "wrong"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["detail"],
            "No active account found with the given credentials."
        );
    }

    #[tokio::test]
    async fn test_search_and_dashboard() {
        let (ctx, _) = setup(RecordingMailer::default()).await;
        let token = access_token(&ctx).await;

        ctx.catalog
            .create(NewComponent {
                name: "LED red".to_string(),
                description: Some("5mm diffused".to_string()),
                quantity: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        ctx.catalog
            .create(NewComponent {
                name: "LED green".to_string(),
                quantity: 30,
                ..Default::default()
            })
            .await
            .unwrap();

        let response = send(&ctx, get_with_token("/components/search/?term=led", &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

        let response = send(&ctx, get_with_token("/components/search/?term=diffused", &token)).await;
        assert_eq!(body_json(response).await[0]["name"], "LED red");

        let response = send(&ctx, get_with_token("/components/search/?term=tube", &token)).await;
        assert!(body_json(response).await.as_array().unwrap().is_empty());

        let response = send(&ctx, get_with_token("/components/search/", &token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["detail"],
            "Query parameter 'term' is required."
        );

        let response = send(&ctx, get_with_token("/components/search/?term=", &token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&ctx, get_with_token("/dashboard/", &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let summary = body_json(response).await;
        assert_eq!(summary["most_frequent_searches"].as_array().unwrap().len(), 2);
        assert_eq!(summary["missing_searches"][0]["search_term"], "tube");
        assert_eq!(summary["missing_searches"][0]["count"], 1);
        assert_eq!(summary["alerts"][0]["name"], "LED red");
        assert_eq!(summary["alerts"].as_array().unwrap().len(), 1);

        let single: Option<i64> =
            sqlx::query_scalar("SELECT component_id FROM search_log WHERE search_term = 'diffused'")
                .fetch_one(&ctx.db)
                .await
                .unwrap();
        assert_eq!(single, Some(1));
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let (ctx, _) = setup(RecordingMailer::default()).await;

        for uri in ["/dashboard/", "/components/search/?term=led"] {
            let response = send(
                &ctx,
                Request::builder().uri(uri).body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

            let response = send(&ctx, get_with_token(uri, "garbage")).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let (ctx, _) = setup(RecordingMailer::default()).await;
        let token = access_token(&ctx).await;

        let response = send(&ctx, get_with_token("/dashboard/", &token)).await;
        let summary = body_json(response).await;
        for key in ["most_frequent_searches", "alerts", "missing_searches"] {
            assert!(summary[key].as_array().unwrap().is_empty(), "{} not empty", key);
        }
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (ctx, _) = setup(RecordingMailer::default()).await;
        send(
            &ctx,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;

        let response = send(
            &ctx,
            Request::builder().uri("/metrics").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("http_requests_total"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (ctx, _) = setup(RecordingMailer::default()).await;
        let response = send(
            &ctx,
            Request::builder().uri("/nope").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "Not found.");
    }
}
