//! List trait for querying collections of entities.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::client::SystemLinkClient;
use crate::error::Result;
use crate::pagination::{fetch_all, ContinuationQuery, Page, PageSource};

/// Query entities with continuation-token pagination.
///
/// Implement this trait for entity types served by a paged query endpoint.
///
/// # Example
///
/// ```ignore
/// use systemlink::{SystemLinkClient, Product, ProductQuery, List};
///
/// let client = SystemLinkClient::from_env()?;
/// let query = ProductQuery::builder()
///     .filter("family == @0")
///     .substitution("Amplifiers")
///     .build()?;
///
/// // Fetch a single page
/// let page = Product::list_page(&client, &query).await?;
///
/// // Fetch all pages
/// let all_products = Product::list_all(&client, query).await?;
/// ```
#[async_trait]
pub trait List: Sized + Send {
    /// Query parameters, including the continuation token.
    type Query: ContinuationQuery + Clone + Send + Sync;

    /// Fetch the page `query` points at.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a record cannot be mapped.
    async fn list_page(client: &SystemLinkClient, query: &Self::Query) -> Result<Page<Self>>;

    /// Fetch every matching entity, following continuation tokens.
    ///
    /// # Errors
    ///
    /// Returns the first error hit; items from earlier pages are dropped.
    async fn list_all(client: &SystemLinkClient, query: Self::Query) -> Result<Vec<Self>> {
        fetch_all(&ListSource::<Self>::new(client), query).await
    }
}

/// [`PageSource`] over a [`List`] implementation.
///
/// Pass it to [`fetch_pages`](crate::fetch_pages) to walk results one page
/// at a time.
pub struct ListSource<'c, T> {
    client: &'c SystemLinkClient,
    _entity: PhantomData<fn() -> T>,
}

impl<'c, T> ListSource<'c, T> {
    pub fn new(client: &'c SystemLinkClient) -> Self {
        Self {
            client,
            _entity: PhantomData,
        }
    }
}

#[async_trait]
impl<'c, T: List> PageSource for ListSource<'c, T> {
    type Item = T;
    type Query = T::Query;

    async fn fetch_page(&self, query: &Self::Query) -> Result<Page<T>> {
        T::list_page(self.client, query).await
    }
}
