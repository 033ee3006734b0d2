//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::client::SystemLinkClient;
use crate::error::Result;

/// Fetch a single entity by ID.
///
/// # Example
///
/// ```ignore
/// use systemlink::{SystemLinkClient, Product, Get};
///
/// let client = SystemLinkClient::from_env()?;
/// let product = Product::get(&client, "5e30934193cac8046851acb2".to_string()).await?;
/// ```
#[async_trait]
pub trait Get: Sized {
    /// The ID type for this entity.
    type Id;

    /// Fetch the entity by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found or the request fails.
    async fn get(client: &SystemLinkClient, id: Self::Id) -> Result<Self>;
}
