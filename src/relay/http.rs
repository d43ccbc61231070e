//! HTTP server setup with Axum

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use super::handler::{example_handler, latest_handler, root_handler, stats_handler};
use super::state::RelayState;

/// Create the Axum router with all relay endpoints
pub fn create_router(state: Arc<RelayState>) -> Router {
    // The public page and third-party dashboards read these cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let stats_route = format!("/{}", state.stats_path);

    Router::new()
        // WebSocket stream (plain GET returns a banner)
        .route("/", get(root_handler))
        .route("/latest.json", get(latest_handler))
        .route("/example.json", get(example_handler))
        .route(&stats_route, get(stats_handler))
        // Health check
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    #[tokio::test]
    async fn test_health_check() {
        let state = Arc::new(RelayState::new(&FeedConfig::default()));
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_plain_root_returns_banner() {
        let state = Arc::new(RelayState::new(&FeedConfig::default()));
        let app = create_router(state);

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }
}
