//! SystemLink API client library.
//!
//! Typed access to the SystemLink auth, feeds and test monitor product
//! services. Each endpoint is an async function (or a small trait) taking a
//! plain request value and an injected [`SystemLinkClient`].
//!
//! # Quick Start
//!
//! ```no_run
//! use systemlink::{ProductQuery, SystemLinkClient};
//!
//! #[tokio::main]
//! async fn main() -> systemlink::Result<()> {
//!     // Create client from environment variables
//!     let client = SystemLinkClient::from_env()?;
//!
//!     // Query products of one family, 100 per request
//!     let query = ProductQuery::builder()
//!         .filter("family == @0")
//!         .substitution("cRIO")
//!         .take(100)
//!         .build()?;
//!
//!     let products = systemlink::query_products(&client, query).await?;
//!     println!("Found {} products", products.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`query`] builds and validates requests before anything is sent.
//! - [`pagination`] follows continuation tokens, either collecting every
//!   page ([`fetch_all`]) or yielding them one at a time ([`fetch_pages`]).
//! - [`mapping`] decodes raw JSON records through a per-record field table
//!   into types whose optional attributes are a tri-state [`Field`].
//! - Batch create/update/delete return a [`BatchResponse`] that may be a
//!   partial success; callers inspect `failed` explicitly.
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `SYSTEMLINK_API_KEY` (required) - API key sent as `x-ni-api-key`
//! - `SYSTEMLINK_SERVER_URI` (optional) - Server URL (defaults to
//!   `https://api.systemlinkcloud.com`)
//! - `SYSTEMLINK_TIMEOUT_SECS` (optional) - Request timeout (defaults to 300)

pub mod cli;
mod client;
mod config;
mod error;
pub mod mapping;
mod models;
pub mod output;
pub mod pagination;
pub mod query;
mod traits;
pub mod upload;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use client::SystemLinkClient;
pub use config::{HttpConfiguration, API_KEY_ENV, SERVER_URI_ENV, TIMEOUT_ENV};
pub use error::{ApiError, Result, SystemLinkError};
pub use mapping::{map_record, Field, FieldSpec, WireRecord};
pub use output::PrettyPrint;
pub use pagination::{fetch_all, fetch_pages, ContinuationQuery, Page, PageSource, Paginator};
pub use query::{
    ProductField, ProductListQuery, ProductOrderBy, ProductQuery, ProductQueryBuilder,
    ProductValuesField, ProductValuesQuery, MAX_TAKE,
};

// Re-export traits
pub use traits::{Get, List, ListSource};

// Re-export models
pub use models::{
    // Product types
    ApiInfo,
    CreateProductsResponse,
    ListProducts,
    Operation,
    Product,
    ProductRequest,
    ProductUpdateRequest,
    QueryProducts,
    UpdateProductsResponse,
    // Batch types
    BatchResponse,
    Correlate,
    DeleteResponse,
    // Auth types
    AuthInfo,
    AuthPolicy,
    AuthStatement,
    Org,
    User,
    UserStatus,
    Workspace,
    // Feed types
    CreateFeedRequest,
    Feed,
    FeedQuery,
    Package,
    PackageMetadata,
    Platform,
};

// Re-export endpoint functions
pub use models::{
    api_info, create_products, delete_product, delete_products, get_all_products,
    get_products_page, query_product_values, query_products, query_products_page,
    update_products,
};
pub use models::{authenticate, create_feed, delete_feed, query_feeds, upload_package};
pub use upload::{upload_packages, upload_single_package, UploadOptions, UploadReport};
