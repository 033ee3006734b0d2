//! Product model and test monitor product endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::SystemLinkClient;
use crate::error::{ApiError, Result, SystemLinkError};
use crate::mapping::{map_record, map_records, Field, FieldSpec, WireRecord};
use crate::models::batch::{BatchResponse, Correlate, DeleteResponse};
use crate::pagination::{fetch_all, Page, PageSource};
use crate::query::{ProductField, ProductListQuery, ProductQuery, ProductValuesQuery};
use crate::traits::{Get, List, ListSource};

const SERVICE: &str = "nitestmonitor/v2/";

/// Fields every create, update and get response must carry.
const ENTITY_REQUIRED: &[&str] = &["id", "partNumber"];

/// A product in the test monitor catalog.
///
/// Every attribute is a [`Field`], so a value the server did not send (for
/// instance because it was not projected) is distinguishable from one it
/// sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub id: Field<String>,

    /// Business key; immutable once created.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub part_number: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub name: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub family: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub keywords: Field<Vec<String>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub properties: Field<HashMap<String, String>>,

    /// Ids of files attached to the product.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub file_ids: Field<Vec<String>>,

    /// Owning workspace id.
    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub workspace: Field<String>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub created_at: Field<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Field::is_unset")]
    pub updated_at: Field<DateTime<Utc>>,
}

impl WireRecord for Product {
    const RECORD: &'static str = "Product";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("id", "id"),
        FieldSpec::new("partNumber", "part_number"),
        FieldSpec::new("name", "name"),
        FieldSpec::new("family", "family"),
        FieldSpec::new("keywords", "keywords"),
        FieldSpec::new("properties", "properties"),
        FieldSpec::new("fileIds", "file_ids"),
        FieldSpec::new("workspace", "workspace"),
        FieldSpec::new("createdAt", "created_at"),
        FieldSpec::new("updatedAt", "updated_at"),
    ];
}

impl Product {
    /// The id, when the server sent one.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The part number, when the server sent one.
    pub fn part_number(&self) -> Option<&str> {
        self.part_number.as_deref()
    }
}

/// A product to create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub part_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ids: Option<Vec<String>>,

    /// Workspace id; the caller's default workspace when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl ProductRequest {
    pub fn new(part_number: impl Into<String>) -> Self {
        Self {
            part_number: part_number.into(),
            ..Default::default()
        }
    }
}

impl Correlate<Product> for ProductRequest {
    fn correlates_with(&self, item: &Product) -> bool {
        item.part_number() == Some(self.part_number.as_str())
    }
}

/// Changes to an existing product.
///
/// Fields left as `None` are not sent. The part number cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdateRequest {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl ProductUpdateRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

impl Correlate<Product> for ProductUpdateRequest {
    fn correlates_with(&self, item: &Product) -> bool {
        item.id() == Some(self.id.as_str())
    }
}

/// Result of [`create_products`].
pub type CreateProductsResponse = BatchResponse<Product, ProductRequest>;

/// Result of [`update_products`].
pub type UpdateProductsResponse = BatchResponse<Product, ProductUpdateRequest>;

impl CreateProductsResponse {
    /// Part numbers of the products that were not created.
    pub fn failed_part_numbers(&self) -> Vec<&str> {
        self.failed_items()
            .iter()
            .map(|r| r.part_number.as_str())
            .collect()
    }
}

impl UpdateProductsResponse {
    /// Ids of the products that were not updated.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failed_items().iter().map(|r| r.id.as_str()).collect()
    }
}

/// Availability of one service operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub available: bool,
    pub version: u32,
}

/// Operations the test monitor service exposes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    #[serde(default)]
    pub operations: HashMap<String, Operation>,
}

impl ApiInfo {
    /// Whether `name` (e.g. `queryProducts`) is available.
    pub fn supports(&self, name: &str) -> bool {
        self.operations.get(name).is_some_and(|op| op.available)
    }
}

/// Raw page body shared by the two product listing endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductsPageResponse {
    #[serde(default)]
    products: Vec<Value>,
    #[serde(default)]
    continuation_token: Option<String>,
    #[serde(default)]
    total_count: Option<u64>,
}

impl ProductsPageResponse {
    fn into_page(self, required: &[&str]) -> Result<Page<Product>> {
        let items = map_records(self.products, required)?;
        Ok(Page::new(items, self.continuation_token, self.total_count))
    }
}

/// Raw create/update body before the products are mapped.
#[derive(Debug, Deserialize)]
struct RawBatchResponse<R> {
    #[serde(default)]
    products: Vec<Value>,
    failed: Option<Vec<R>>,
    error: Option<ApiError>,
}

impl<R> RawBatchResponse<R> {
    fn into_response(self) -> Result<BatchResponse<Product, R>> {
        let response = BatchResponse {
            succeeded: map_records(self.products, ENTITY_REQUIRED)?,
            failed: self.failed,
            error: self.error,
        };
        if !response.is_complete_success() {
            tracing::warn!(
                succeeded = response.succeeded.len(),
                failed = response.failed_count(),
                error = ?response.error.as_ref().and_then(|e| e.message.as_deref()),
                "batch partially applied"
            );
        }
        Ok(response)
    }
}

/// Required wire keys for query results with the given projection.
fn required_for(projection: &[ProductField]) -> Vec<&'static str> {
    if projection.is_empty() {
        return ENTITY_REQUIRED.to_vec();
    }
    projection
        .iter()
        .filter_map(|field| match field {
            ProductField::Id => Some("id"),
            ProductField::PartNumber => Some("partNumber"),
            _ => None,
        })
        .collect()
}

fn product_path(id: &str) -> String {
    format!("{SERVICE}products/{}", urlencoding::encode(id))
}

#[async_trait]
impl Get for Product {
    type Id = String;

    #[tracing::instrument(skip(client))]
    async fn get(client: &SystemLinkClient, id: String) -> Result<Self> {
        let response = client.get(&product_path(&id)).await?;
        let value = SystemLinkClient::json_value(response).await?;
        map_record(value, ENTITY_REQUIRED)
    }
}

#[async_trait]
impl List for Product {
    type Query = ProductQuery;

    #[tracing::instrument(skip(client))]
    async fn list_page(client: &SystemLinkClient, query: &Self::Query) -> Result<Page<Self>> {
        let path = format!("{SERVICE}query-products");
        let response = client.post(&path, query).await?;
        let body: ProductsPageResponse = response.json().await.map_err(SystemLinkError::HttpError)?;
        body.into_page(&required_for(query.projection()))
    }
}

/// Paged `query-products` source.
pub type QueryProducts<'c> = ListSource<'c, Product>;

/// Paged source over the plain `GET products` listing.
#[derive(Debug, Clone, Copy)]
pub struct ListProducts<'c> {
    client: &'c SystemLinkClient,
}

impl<'c> ListProducts<'c> {
    pub fn new(client: &'c SystemLinkClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'c> PageSource for ListProducts<'c> {
    type Item = Product;
    type Query = ProductListQuery;

    async fn fetch_page(&self, query: &ProductListQuery) -> Result<Page<Product>> {
        get_products_page(self.client, query).await
    }
}

/// Get information about the available API operations.
#[tracing::instrument(skip(client))]
pub async fn api_info(client: &SystemLinkClient) -> Result<ApiInfo> {
    let response = client.get(SERVICE).await?;
    response.json().await.map_err(SystemLinkError::HttpError)
}

/// Create products.
///
/// The server may create only some of them; check
/// [`BatchResponse::failed`] on the result.
///
/// # Errors
///
/// Returns [`SystemLinkError::Validation`] for an empty batch and an API
/// error if the whole request is rejected. Individual bad items (a blank or
/// duplicate part number) come back in `failed`.
#[tracing::instrument(skip(client, products), fields(count = products.len()))]
pub async fn create_products(
    client: &SystemLinkClient,
    products: Vec<ProductRequest>,
) -> Result<CreateProductsResponse> {
    if products.is_empty() {
        return Err(SystemLinkError::Validation(
            "at least one product is required".to_string(),
        ));
    }

    #[derive(Serialize)]
    struct Body {
        products: Vec<ProductRequest>,
    }

    let path = format!("{SERVICE}products");
    let response = client.post(&path, &Body { products }).await?;
    let raw: RawBatchResponse<ProductRequest> =
        response.json().await.map_err(SystemLinkError::HttpError)?;
    raw.into_response()
}

/// Update products.
///
/// Keywords and properties are merged into the existing values unless
/// `replace` is set, in which case they overwrite them.
#[tracing::instrument(skip(client, products), fields(count = products.len()))]
pub async fn update_products(
    client: &SystemLinkClient,
    products: Vec<ProductUpdateRequest>,
    replace: bool,
) -> Result<UpdateProductsResponse> {
    if products.is_empty() {
        return Err(SystemLinkError::Validation(
            "at least one product is required".to_string(),
        ));
    }

    #[derive(Serialize)]
    struct Body {
        products: Vec<ProductUpdateRequest>,
        replace: bool,
    }

    let path = format!("{SERVICE}update-products");
    let response = client.post(&path, &Body { products, replace }).await?;
    let raw: RawBatchResponse<ProductUpdateRequest> =
        response.json().await.map_err(SystemLinkError::HttpError)?;
    raw.into_response()
}

/// Delete one product.
#[tracing::instrument(skip(client))]
pub async fn delete_product(client: &SystemLinkClient, id: &str) -> Result<()> {
    client.delete(&product_path(id)).await?;
    Ok(())
}

/// Delete several products.
///
/// An empty success body means every id was deleted.
#[tracing::instrument(skip(client))]
pub async fn delete_products(
    client: &SystemLinkClient,
    ids: Vec<String>,
) -> Result<DeleteResponse> {
    #[derive(Serialize)]
    struct Body<'a> {
        ids: &'a [String],
    }

    let path = format!("{SERVICE}delete-products");
    let response = client.post(&path, &Body { ids: &ids }).await?;
    let text = response.text().await.map_err(SystemLinkError::HttpError)?;
    if text.trim().is_empty() {
        return Ok(DeleteResponse::all_deleted(ids));
    }

    let result: DeleteResponse = serde_json::from_str(&text)?;
    if !result.is_complete_success() {
        tracing::warn!(
            deleted = result.ids.len(),
            failed = result.failed.as_ref().map_or(0, Vec::len),
            "batch delete partially applied"
        );
    }
    Ok(result)
}

/// List the distinct values of one product field.
///
/// # Errors
///
/// Returns [`SystemLinkError::Validation`] without sending anything when the
/// filter and substitutions disagree.
#[tracing::instrument(skip(client))]
pub async fn query_product_values(
    client: &SystemLinkClient,
    query: &ProductValuesQuery,
) -> Result<Vec<String>> {
    query.validate()?;
    let path = format!("{SERVICE}query-product-values");
    let response = client.post(&path, query).await?;
    response.json().await.map_err(SystemLinkError::HttpError)
}

/// Fetch one page of the plain product listing.
#[tracing::instrument(skip(client))]
pub async fn get_products_page(
    client: &SystemLinkClient,
    query: &ProductListQuery,
) -> Result<Page<Product>> {
    query.validate()?;
    let path = format!("{SERVICE}products");
    let response = client.get_with_query(&path, query).await?;
    let body: ProductsPageResponse = response.json().await.map_err(SystemLinkError::HttpError)?;
    body.into_page(ENTITY_REQUIRED)
}

/// Fetch every product, following continuation tokens.
pub async fn get_all_products(
    client: &SystemLinkClient,
    query: ProductListQuery,
) -> Result<Vec<Product>> {
    fetch_all(&ListProducts::new(client), query).await
}

/// Fetch one page of a product query.
pub async fn query_products_page(
    client: &SystemLinkClient,
    query: &ProductQuery,
) -> Result<Page<Product>> {
    Product::list_page(client, query).await
}

/// Fetch every product matching `query`.
pub async fn query_products(
    client: &SystemLinkClient,
    query: ProductQuery,
) -> Result<Vec<Product>> {
    Product::list_all(client, query).await
}
