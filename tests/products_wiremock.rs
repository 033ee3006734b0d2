//! Product endpoint tests against wiremock.
//!
//! These pin down the exact requests sent and how responses are mapped,
//! including continuation paging and partial batch results.

use serde_json::json;
use systemlink::{
    create_products, delete_products, fetch_pages, query_product_values, query_products,
    update_products, ApiInfo, Field, Get, Product, ProductField, ProductQuery, ProductRequest,
    ProductUpdateRequest, ProductValuesField, ProductValuesQuery, QueryProducts, SystemLinkClient,
    SystemLinkError,
};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn product_json(id: &str, part_number: &str) -> serde_json::Value {
    json!({
        "id": id,
        "partNumber": part_number,
        "name": null,
        "family": "cRIO",
        "keywords": [],
        "properties": {},
        "fileIds": [],
        "workspace": "846e294a-a007-47ac-9fc2-fac07eab240e",
        "updatedAt": "2024-03-01T10:00:00Z"
    })
}

fn client_for(server: &MockServer) -> SystemLinkClient {
    SystemLinkClient::new("test-key", &server.uri()).unwrap()
}

#[tokio::test]
async fn test_get_product_sends_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nitestmonitor/v2/products/5e30934193cac8046851acb2"))
        .and(header("x-ni-api-key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(product_json("5e30934193cac8046851acb2", "156502A-11L")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let product = Product::get(&client, "5e30934193cac8046851acb2".to_string())
        .await
        .unwrap();

    assert_eq!(product.part_number(), Some("156502A-11L"));
    assert!(product.name.is_null());
    assert!(product.created_at.is_unset());
    assert_eq!(product.family, Field::Value("cRIO".to_string()));
}

#[tokio::test]
async fn test_not_found_carries_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nitestmonitor/v2/products/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "name": "Skyline.NotFound",
                "code": -251042,
                "message": "Product with ID 'missing' does not exist.",
                "args": ["missing"],
                "innerErrors": []
            }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = Product::get(&client, "missing".to_string()).await.unwrap_err();

    assert!(err.is_not_found());
    let api_error = err.api_error().unwrap();
    assert_eq!(api_error.code, Some(-251042));
    assert_eq!(api_error.args, vec!["missing".to_string()]);
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_get_without_required_field_is_schema_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/nitestmonitor/v2/products/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "p1"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = Product::get(&client, "p1".to_string()).await.unwrap_err();

    assert!(matches!(
        err,
        SystemLinkError::Schema {
            record: "Product",
            field: "part_number"
        }
    ));
}

#[tokio::test]
async fn test_query_follows_continuation_tokens() {
    let mock_server = MockServer::start().await;

    // First request asks for the count; later ones don't
    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/query-products"))
        .and(body_json(json!({
            "filter": "family == @0",
            "substitutions": ["cRIO"],
            "descending": false,
            "take": 2,
            "returnCount": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [product_json("p1", "A-1"), product_json("p2", "A-2")],
            "continuationToken": "page-2",
            "totalCount": 3
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/query-products"))
        .and(body_partial_json(json!({
            "continuationToken": "page-2",
            "returnCount": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [product_json("p3", "A-3")],
            "continuationToken": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = ProductQuery::builder()
        .filter("family == @0")
        .substitution("cRIO")
        .take(2)
        .return_count(true)
        .build()
        .unwrap();

    let source = QueryProducts::new(&client);
    let mut pages = fetch_pages(&source, query);

    let first = pages.next_page().await.unwrap().unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first.total_count, Some(3));

    let second = pages.next_page().await.unwrap().unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second.total_count, Some(3));
    assert_eq!(second.items[0].part_number(), Some("A-3"));

    assert!(pages.next_page().await.is_none());
    assert_eq!(pages.pages_fetched(), 2);
}

#[tokio::test]
async fn test_repeated_token_stops_paging() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/query-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [product_json("p1", "A-1")],
            "continuationToken": "same"
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = ProductQuery::builder().build().unwrap();
    let err = query_products(&client, query).await.unwrap_err();

    assert!(matches!(err, SystemLinkError::StalledPagination { token } if token == "same"));
}

#[tokio::test]
async fn test_projection_relaxes_required_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/query-products"))
        .and(body_partial_json(json!({"projection": ["PART_NUMBER", "NAME"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [{"partNumber": "A-1", "name": "Thing"}],
            "continuationToken": null
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = ProductQuery::builder()
        .project(ProductField::PartNumber)
        .project(ProductField::Name)
        .build()
        .unwrap();
    let products = query_products(&client, query).await.unwrap();

    assert_eq!(products.len(), 1);
    assert!(products[0].id.is_unset());
    assert_eq!(products[0].name, Field::Value("Thing".to_string()));
}

#[tokio::test]
async fn test_invalid_query_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let values = ProductValuesQuery::new(ProductValuesField::Family)
        .with_filter("name == @0 && family == @1", ["only one"]);
    let err = query_product_values(&client, &values).await.unwrap_err();
    assert!(matches!(err, SystemLinkError::Validation(_)));

    let err = create_products(&client, Vec::new()).await.unwrap_err();
    assert!(matches!(err, SystemLinkError::Validation(_)));
}

#[tokio::test]
async fn test_blank_part_number_is_left_to_the_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/products"))
        .and(body_partial_json(json!({
            "products": [{"partNumber": "OK-1"}, {"partNumber": ""}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [product_json("p1", "OK-1")],
            "failed": [{"partNumber": ""}],
            "error": {
                "name": "Skyline.OneOrMoreErrorsOccurred",
                "message": "One or more errors occurred.",
                "innerErrors": [{
                    "name": "Skyline.TestMonitor.InvalidPartNumber",
                    "message": "Part number must not be empty."
                }]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let requests = vec![ProductRequest::new("OK-1"), ProductRequest::new("")];
    let response = create_products(&client, requests.clone()).await.unwrap();

    assert_eq!(response.succeeded.len(), 1);
    assert_eq!(response.failed_part_numbers(), vec![""]);
    assert!(response.succeeded_for(&requests[1]).is_none());
    assert!(response.error.is_some());
}

#[tokio::test]
async fn test_create_with_no_successes_is_still_ok() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [],
            "failed": [{"partNumber": "DUP-1"}, {"partNumber": "DUP-2"}],
            "error": {
                "name": "Skyline.OneOrMoreErrorsOccurred",
                "message": "One or more errors occurred.",
                "innerErrors": [
                    {"name": "Skyline.TestMonitor.ProductAlreadyExists", "resourceId": "DUP-1"},
                    {"name": "Skyline.TestMonitor.ProductAlreadyExists", "resourceId": "DUP-2"}
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let requests = vec![ProductRequest::new("DUP-1"), ProductRequest::new("DUP-2")];
    let response = create_products(&client, requests).await.unwrap();

    assert!(response.succeeded.is_empty());
    assert!(!response.is_complete_success());
    assert_eq!(response.failed_part_numbers(), vec!["DUP-1", "DUP-2"]);
    let error = response.error.unwrap();
    assert_eq!(error.inner_errors.len(), 2);
}

#[tokio::test]
async fn test_create_partial_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/products"))
        .and(body_partial_json(json!({
            "products": [{"partNumber": "NEW-1"}, {"partNumber": "DUP-1"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [product_json("p9", "NEW-1")],
            "failed": [{"partNumber": "DUP-1"}],
            "error": {
                "name": "Skyline.OneOrMoreErrorsOccurred",
                "message": "One or more errors occurred.",
                "innerErrors": [{
                    "name": "Skyline.TestMonitor.ProductAlreadyExists",
                    "resourceId": "DUP-1"
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let requests = vec![ProductRequest::new("NEW-1"), ProductRequest::new("DUP-1")];
    let response = create_products(&client, requests.clone()).await.unwrap();

    assert!(!response.is_complete_success());
    assert_eq!(response.failed_part_numbers(), vec!["DUP-1"]);
    assert_eq!(
        response.succeeded_for(&requests[0]).and_then(Product::id),
        Some("p9")
    );
    assert!(response.succeeded_for(&requests[1]).is_none());

    let error = response.error.unwrap();
    assert_eq!(error.flatten().len(), 2);
    assert_eq!(error.inner_errors[0].resource_id.as_deref(), Some("DUP-1"));
}

#[tokio::test]
async fn test_update_sends_replace_flag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/update-products"))
        .and(body_json(json!({
            "products": [{"id": "p1", "keywords": ["new"]}],
            "replace": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [product_json("p1", "A-1")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = ProductUpdateRequest {
        keywords: Some(vec!["new".to_string()]),
        ..ProductUpdateRequest::new("p1")
    };
    let response = update_products(&client, vec![request], true).await.unwrap();

    assert!(response.is_complete_success());
    assert_eq!(response.succeeded.len(), 1);
    assert!(response.failed_ids().is_empty());
}

#[tokio::test]
async fn test_delete_products_empty_body_means_all_deleted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/delete-products"))
        .and(body_json(json!({"ids": ["p1", "p2"]})))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = delete_products(&client, vec!["p1".to_string(), "p2".to_string()])
        .await
        .unwrap();

    assert!(response.is_complete_success());
    assert_eq!(response.ids, vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_delete_products_partial() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/delete-products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ids": ["p1"],
            "failed": ["p2"],
            "error": {"name": "Skyline.OneOrMoreErrorsOccurred"}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let response = delete_products(&client, vec!["p1".to_string(), "p2".to_string()])
        .await
        .unwrap();

    assert!(!response.is_complete_success());
    assert_eq!(response.failed, Some(vec!["p2".to_string()]));
}

#[tokio::test]
async fn test_product_values_and_api_info() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/nitestmonitor/v2/query-product-values"))
        .and(body_json(json!({"field": "FAMILY", "startsWith": "c"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["cDAQ", "cRIO"])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/nitestmonitor/v2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "operations": {
                "queryProducts": {"available": true, "version": 2},
                "deleteProducts": {"available": false, "version": 1}
            }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let values = query_product_values(
        &client,
        &ProductValuesQuery::new(ProductValuesField::Family).starts_with("c"),
    )
    .await
    .unwrap();
    assert_eq!(values, vec!["cDAQ", "cRIO"]);

    let info: ApiInfo = systemlink::api_info(&client).await.unwrap();
    assert!(info.supports("queryProducts"));
    assert!(!info.supports("deleteProducts"));
    assert!(!info.supports("createProducts"));
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = Product::get(&client, "p1".to_string()).await.unwrap_err();

    assert!(matches!(
        err,
        SystemLinkError::RateLimited {
            retry_after_secs: Some(7)
        }
    ));
}
