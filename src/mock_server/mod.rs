//! Mock SystemLink server for E2E testing.
//!
//! This module provides an in-memory server that simulates the auth, feeds
//! and test monitor services. Unlike wiremock, which mocks at the HTTP level
//! per test, this server keeps state across requests so whole workflows
//! (create, page, update, delete, upload) can be exercised.
//!
//! # Example
//!
//! ```ignore
//! use systemlink::mock_server::MockServer;
//! use systemlink::{query_products, ProductQuery, SystemLinkClient};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = SystemLinkClient::new("test-key", server.url()).unwrap();
//!
//!     // Server comes with default fixtures
//!     let query = ProductQuery::builder()
//!         .filter("family == @0")
//!         .substitution("cRIO")
//!         .build()
//!         .unwrap();
//!     let products = query_products(&client, query).await.unwrap();
//!     assert_eq!(products.len(), 3);
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{DefaultScenario, Fixtures, DEFAULT_WORKSPACE_ID, LAB_WORKSPACE_ID};
pub use server::MockServer;
pub use state::{MockError, MockState};
