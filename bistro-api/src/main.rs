use std::net::SocketAddr;

use bistro_service::run_migrations;
use dotenvy::dotenv;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extract;
mod handlers;
mod models;
mod rate_limit;
mod state;

use config::Config;
use handlers::{cors_layer, create_router};
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let state = AppState::new(&config);

    let applied = state
        .db(|conn| run_migrations(conn))
        .await
        .map_err(|e| format!("Cannot run migrations: {e}"))?;
    info!(applied, "database migrations up to date");

    let limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        loop {
            interval.tick().await;
            limiter.cleanup().await;
            let clients = limiter.tracked_clients().await;
            debug!(clients, "rate limiter pruned");
        }
    });

    let app = create_router(state, cors_layer(config.cors_allowed_origins.as_deref()));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Bistro API listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use chrono::TimeDelta;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost:1/bistro_test".to_string(),
            secret_key: "test-secret".to_string(),
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            db_pool_size: 1,
            cors_allowed_origins: None,
            access_token_ttl: TimeDelta::hours(1),
            rate_limit_window: Duration::from_secs(60),
        }
    }

    fn test_app() -> (Router, AppState) {
        let state = AppState::new(&test_config());
        (create_router(state.clone(), cors_layer(None)), state)
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let (app, _) = test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let doc = json_body(response).await;
        assert!(doc["paths"]["/api/reservations"].is_object());
        assert!(doc["paths"]["/api/menu/items/{id}"].is_object());
        assert!(doc["components"]["securitySchemes"]["bearer"].is_object());
    }

    #[tokio::test]
    async fn test_admin_route_requires_token() {
        let (app, _) = test_app();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/menu/categories")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "Wine"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Authentication failed");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/customers")
                    .header(header::AUTHORIZATION, "Bearer not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"], "Invalid token");
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let (app, _) = test_app();
        let foreign = bistro_service::auth::TokenIssuer::new("other", TimeDelta::hours(1))
            .issue(uuid::Uuid::new_v4())
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/auth/me")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", foreign.access_token),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_validation_errors_are_json() {
        let (app, state) = test_app();
        let token = state.tokens.issue(uuid::Uuid::new_v4()).unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/time-slots?date=next-friday")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/menu/items/not-a-uuid")
                    .header(
                        header::AUTHORIZATION,
                        format!("Bearer {}", token.access_token),
                    )
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/reservations")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "Ada"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_review_submissions_are_rate_limited() {
        let (app, _) = test_app();

        let submit = || {
            Request::builder()
                .method("POST")
                .uri("/api/reviews")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "203.0.113.7")
                .body(Body::from("{}"))
                .unwrap()
        };

        for _ in 0..rate_limit::REVIEW_LIMIT {
            let response = app.clone().oneshot(submit()).await.unwrap();
            assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        }
        let response = app.clone().oneshot(submit()).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            json_body(response).await["error"],
            "Too many requests, try again later"
        );
    }
}
