//! Mock SystemLink API server.
//!
//! Provides an axum-based HTTP server that simulates the auth, feeds and
//! test monitor services.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{DefaultScenario, Fixtures};
use super::handlers::{self, SharedState};
use super::state::MockState;

/// A mock SystemLink API server for testing.
///
/// The server runs in the background and can be used to test the SystemLink
/// client against a realistic API implementation.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Self::default_state()).await
    }

    /// Start a mock server with empty state.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    ///
    /// Use this URL as the server URI when creating a `SystemLinkClient`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the default state with common test fixtures.
    fn default_state() -> MockState {
        Self::state_from_scenario(Fixtures::default_scenario())
    }

    /// Create state from a scenario.
    fn state_from_scenario(scenario: DefaultScenario) -> MockState {
        let mut state = MockState::new().with_auth(scenario.auth);

        for product in scenario.products {
            state = state.with_product(product);
        }

        for feed in scenario.feeds {
            state = state.with_feed(feed);
        }

        state
    }

    /// Create the axum router with all routes.
    fn create_router(state: SharedState) -> Router {
        Router::new()
            // Test monitor routes
            .route("/nitestmonitor/v2/", get(handlers::api_info))
            .route(
                "/nitestmonitor/v2/products",
                get(handlers::list_products).post(handlers::create_products),
            )
            .route(
                "/nitestmonitor/v2/products/:id",
                get(handlers::get_product).delete(handlers::delete_product),
            )
            .route("/nitestmonitor/v2/query-products", post(handlers::query_products))
            .route("/nitestmonitor/v2/update-products", post(handlers::update_products))
            .route("/nitestmonitor/v2/delete-products", post(handlers::delete_products))
            .route(
                "/nitestmonitor/v2/query-product-values",
                post(handlers::query_product_values),
            )
            // Auth routes
            .route("/niauth/v1/auth", get(handlers::get_auth))
            // Feed routes
            .route(
                "/nifeed/v1/feeds",
                get(handlers::list_feeds).post(handlers::create_feed),
            )
            .route("/nifeed/v1/feeds/:feed_id", delete(handlers::delete_feed))
            .route(
                "/nifeed/v1/feeds/:feed_id/packages",
                post(handlers::upload_package),
            )
            .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key))
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Reject requests without the configured API key.
async fn require_api_key(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.read().await.required_key.clone();

    if let Some(expected) = expected {
        let sent = request
            .headers()
            .get("x-ni-api-key")
            .and_then(|v| v.to_str().ok());
        if sent != Some(expected.as_str()) {
            return handlers::error_response(
                StatusCode::UNAUTHORIZED,
                "Skyline.Unauthorized",
                "Invalid or missing API key.",
            );
        }
    }

    next.run(request).await
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Get, Product, SystemLinkClient, SystemLinkError};
    use axum::body::Body;
    use axum::http;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        // Server should be accessible
        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_router_requires_api_key() {
        let state = MockState::new().with_required_key("secret").shared();
        let app = MockServer::create_router(state);

        let response = app
            .clone()
            .oneshot(http::Request::builder().uri("/niauth/v1/auth").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .clone()
            .oneshot(
                http::Request::builder()
                    .uri("/niauth/v1/auth")
                    .header("x-ni-api-key", "secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Health stays open
        let response = app
            .oneshot(http::Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_product_with_client() {
        let server = MockServer::start().await;
        let client = SystemLinkClient::new("test-key", server.url()).unwrap();

        let id = server.state().read().await.products.keys().next().unwrap().clone();
        let product = Product::get(&client, id.clone())
            .await
            .expect("Failed to get product");

        assert_eq!(product.id(), Some(id.as_str()));
        assert_eq!(product.part_number(), Some("156502A-11L"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_empty_server() {
        let server = MockServer::start_empty().await;
        let client = SystemLinkClient::new("test-key", server.url()).unwrap();

        let err = Product::get(&client, "nonexistent".to_string())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        let api_error = err.api_error().expect("structured error");
        assert_eq!(api_error.name.as_deref(), Some("Skyline.NotFound"));
        assert!(matches!(err, SystemLinkError::Api { status_code: 404, .. }));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_wrong_key_is_rejected() {
        let server = MockServer::with_state(MockState::new().with_required_key("secret")).await;
        let client = SystemLinkClient::new("wrong", server.url()).unwrap();

        let err = crate::authenticate(&client).await.unwrap_err();
        assert_eq!(err.status_code(), Some(401));

        server.shutdown().await;
    }
}
