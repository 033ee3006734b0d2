//! Test monitor product endpoint handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::SharedState;
use crate::mapping::WireRecord;
use crate::mock_server::state::MockError;
use crate::query::{ProductField, ProductOrderBy, ProductValuesField};
use crate::{Product, ProductRequest, ProductUpdateRequest};

/// Page size when the request does not give one.
const DEFAULT_TAKE: usize = 1000;

/// Query parameters for `GET products`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsParams {
    pub take: Option<usize>,
    pub continuation_token: Option<String>,
    #[serde(default)]
    pub return_count: bool,
}

/// Body of `query-products`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProductsBody {
    pub filter: Option<String>,
    #[serde(default)]
    pub substitutions: Vec<Value>,
    pub order_by: Option<ProductOrderBy>,
    #[serde(default)]
    pub descending: bool,
    #[serde(default)]
    pub projection: Vec<ProductField>,
    pub take: Option<usize>,
    pub continuation_token: Option<String>,
    #[serde(default)]
    pub return_count: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductsBody {
    pub products: Vec<ProductRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductsBody {
    pub products: Vec<ProductUpdateRequest>,
    #[serde(default)]
    pub replace: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteProductsBody {
    pub ids: Vec<String>,
}

/// Body of `query-product-values`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductValuesBody {
    pub field: ProductValuesField,
    pub filter: Option<String>,
    #[serde(default)]
    pub substitutions: Vec<Value>,
    pub starts_with: Option<String>,
}

fn to_json(product: &Product) -> Value {
    serde_json::to_value(product).unwrap_or(Value::Null)
}

/// Keep only the projected keys of a product.
fn project(product: &Product, projection: &[ProductField]) -> Value {
    let full = to_json(product);
    if projection.is_empty() {
        return full;
    }
    let Value::Object(object) = full else {
        return full;
    };
    let keys: Vec<&str> = projection
        .iter()
        .filter_map(|f| Product::logical_to_wire(f.logical_name()))
        .collect();
    Value::Object(
        object
            .into_iter()
            .filter(|(k, _)| keys.contains(&k.as_str()))
            .collect(),
    )
}

/// Slice one page out of `items`, using the offset as continuation token.
fn paginate(
    items: Vec<Value>,
    take: Option<usize>,
    token: Option<&str>,
    return_count: bool,
) -> Result<Value, MockError> {
    let offset = match token {
        Some(t) => t
            .parse::<usize>()
            .map_err(|_| MockError::BadRequest(format!("invalid continuation token '{t}'")))?,
        None => 0,
    };
    let take = take.unwrap_or(DEFAULT_TAKE);
    let total = items.len();

    let page: Vec<Value> = items.into_iter().skip(offset).take(take).collect();
    let next = offset + page.len();

    let mut body = Map::new();
    body.insert("products".to_string(), Value::Array(page));
    body.insert(
        "continuationToken".to_string(),
        if take > 0 && next < total {
            Value::String(next.to_string())
        } else {
            Value::Null
        },
    );
    if return_count {
        body.insert("totalCount".to_string(), json!(total));
    }
    Ok(Value::Object(body))
}

/// Aggregate error for a partially applied batch.
fn batch_error(messages: Vec<String>) -> Value {
    let inner: Vec<Value> = messages
        .into_iter()
        .map(|m| json!({"name": "Skyline.Conflict", "message": m}))
        .collect();
    json!({
        "name": "Skyline.OneOrMoreErrorsOccurred",
        "message": "One or more errors occurred. See the contained list for details of each error.",
        "innerErrors": inner
    })
}

/// GET /nitestmonitor/v2/
pub async fn api_info() -> Json<Value> {
    let operation = json!({"available": true, "version": 1});
    Json(json!({
        "operations": {
            "createProducts": operation,
            "deleteProducts": operation,
            "queryProducts": operation,
            "updateProducts": operation,
            "queryProductValues": operation
        }
    }))
}

/// GET /nitestmonitor/v2/products/{id}
pub async fn get_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, MockError> {
    let state = state.read().await;
    state
        .get_product(&id)
        .map(|p| Json(to_json(p)))
        .ok_or_else(|| MockError::NotFound(format!("Product with ID '{id}' does not exist.")))
}

/// GET /nitestmonitor/v2/products
pub async fn list_products(
    State(state): State<SharedState>,
    Query(params): Query<ListProductsParams>,
) -> Result<Json<Value>, MockError> {
    let state = state.read().await;
    let items = state.products.values().map(to_json).collect();
    paginate(
        items,
        params.take,
        params.continuation_token.as_deref(),
        params.return_count,
    )
    .map(Json)
}

/// POST /nitestmonitor/v2/query-products
pub async fn query_products(
    State(state): State<SharedState>,
    Json(body): Json<QueryProductsBody>,
) -> Result<Json<Value>, MockError> {
    let state = state.read().await;
    let matched = state.query_products(
        body.filter.as_deref(),
        &body.substitutions,
        body.order_by,
        body.descending,
    )?;
    let items = matched.iter().map(|p| project(p, &body.projection)).collect();
    paginate(
        items,
        body.take,
        body.continuation_token.as_deref(),
        body.return_count,
    )
    .map(Json)
}

/// POST /nitestmonitor/v2/products
pub async fn create_products(
    State(state): State<SharedState>,
    Json(body): Json<CreateProductsBody>,
) -> Json<Value> {
    let mut state = state.write().await;

    let mut created = Vec::new();
    let mut failed = Vec::new();
    let mut messages = Vec::new();
    for request in body.products {
        match state.create_product(request.clone()) {
            Ok(product) => created.push(to_json(&product)),
            Err(e) => {
                messages.push(e.message().to_string());
                failed.push(request);
            }
        }
    }

    if failed.is_empty() {
        Json(json!({ "products": created }))
    } else {
        Json(json!({
            "products": created,
            "failed": failed,
            "error": batch_error(messages)
        }))
    }
}

/// POST /nitestmonitor/v2/update-products
pub async fn update_products(
    State(state): State<SharedState>,
    Json(body): Json<UpdateProductsBody>,
) -> Json<Value> {
    let mut state = state.write().await;

    let mut updated = Vec::new();
    let mut failed = Vec::new();
    let mut messages = Vec::new();
    for request in body.products {
        match state.update_product(request.clone(), body.replace) {
            Some(product) => updated.push(to_json(&product)),
            None => {
                messages.push(format!("Product with ID '{}' does not exist.", request.id));
                failed.push(request);
            }
        }
    }

    if failed.is_empty() {
        Json(json!({ "products": updated }))
    } else {
        Json(json!({
            "products": updated,
            "failed": failed,
            "error": batch_error(messages)
        }))
    }
}

/// DELETE /nitestmonitor/v2/products/{id}
pub async fn delete_product(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, MockError> {
    let mut state = state.write().await;
    if state.delete_product(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(MockError::NotFound(format!("Product with ID '{id}' does not exist.")))
    }
}

/// POST /nitestmonitor/v2/delete-products
pub async fn delete_products(
    State(state): State<SharedState>,
    Json(body): Json<DeleteProductsBody>,
) -> Response {
    let mut state = state.write().await;

    let (deleted, failed): (Vec<String>, Vec<String>) =
        body.ids.into_iter().partition(|id| state.delete_product(id));

    if failed.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let messages = failed
        .iter()
        .map(|id| format!("Product with ID '{id}' does not exist."))
        .collect();
    Json(json!({
        "ids": deleted,
        "failed": failed,
        "error": batch_error(messages)
    }))
    .into_response()
}

/// POST /nitestmonitor/v2/query-product-values
pub async fn query_product_values(
    State(state): State<SharedState>,
    Json(body): Json<ProductValuesBody>,
) -> Result<Json<Vec<String>>, MockError> {
    let state = state.read().await;
    state
        .product_values(
            body.field,
            body.filter.as_deref(),
            &body.substitutions,
            body.starts_with.as_deref(),
        )
        .map(Json)
}
