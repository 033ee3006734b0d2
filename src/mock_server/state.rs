//! Mock server state management.
//!
//! Provides the in-memory data store for the mock SystemLink server.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::mapping::{Field, WireRecord};
use crate::query::{ProductField, ProductOrderBy, ProductValuesField};
use crate::{
    AuthInfo, CreateFeedRequest, Feed, Package, Platform, Product, ProductRequest,
    ProductUpdateRequest,
};

/// Failure of a mock operation, rendered as an API error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    NotFound(String),
    Conflict(String),
    BadRequest(String),
}

impl MockError {
    pub fn message(&self) -> &str {
        match self {
            MockError::NotFound(m) | MockError::Conflict(m) | MockError::BadRequest(m) => m,
        }
    }
}

/// Shared state for the mock server.
///
/// This struct holds all the mock data that the server will serve.
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug, Default)]
pub struct MockState {
    /// Products indexed by ID. IDs sort in creation order.
    pub products: BTreeMap<String, Product>,

    /// Feeds indexed by ID.
    pub feeds: BTreeMap<String, Feed>,

    /// Packages indexed by feed ID.
    pub packages: HashMap<String, Vec<Package>>,

    /// Identity returned by the auth endpoint.
    pub auth: AuthInfo,

    /// Optional API key. If set, requests must send it in `x-ni-api-key`.
    pub required_key: Option<String>,

    next_id: u64,
}

/// One `field == @N` clause of a filter, resolved to a wire key and value.
type Clause = (&'static str, Value);

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a product to the state.
    ///
    /// # Panics
    ///
    /// Panics if the part number is already taken.
    pub fn with_product(mut self, request: ProductRequest) -> Self {
        if let Err(e) = self.create_product(request) {
            panic!("invalid fixture: {e:?}");
        }
        self
    }

    /// Add a feed to the state.
    pub fn with_feed(mut self, request: CreateFeedRequest) -> Self {
        self.create_feed(request);
        self
    }

    /// Set the identity returned by the auth endpoint.
    pub fn with_auth(mut self, auth: AuthInfo) -> Self {
        self.auth = auth;
        self
    }

    /// Set the required API key.
    pub fn with_required_key(mut self, key: &str) -> Self {
        self.required_key = Some(key.to_string());
        self
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:06}", self.next_id)
    }

    fn default_workspace(&self) -> Option<String> {
        self.auth.default_workspace().and_then(|w| w.id.clone())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Get a product by ID.
    pub fn get_product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// Create a product, rejecting blank or duplicate part numbers.
    pub fn create_product(&mut self, request: ProductRequest) -> Result<Product, MockError> {
        if request.part_number.trim().is_empty() {
            return Err(MockError::BadRequest("Part number must not be empty.".to_string()));
        }
        let taken = self
            .products
            .values()
            .any(|p| p.part_number() == Some(request.part_number.as_str()));
        if taken {
            return Err(MockError::Conflict(format!(
                "A product with part number '{}' already exists.",
                request.part_number
            )));
        }

        let now = Utc::now();
        let product = Product {
            id: Field::Value(self.next_id("product")),
            part_number: Field::Value(request.part_number),
            name: request.name.map_or(Field::Null, Field::Value),
            family: request.family.map_or(Field::Null, Field::Value),
            keywords: Field::Value(request.keywords.unwrap_or_default()),
            properties: Field::Value(request.properties.unwrap_or_default()),
            file_ids: Field::Value(request.file_ids.unwrap_or_default()),
            workspace: request
                .workspace
                .or_else(|| self.default_workspace())
                .map_or(Field::Null, Field::Value),
            created_at: Field::Value(now),
            updated_at: Field::Value(now),
        };

        let id = product.id().unwrap_or_default().to_string();
        self.products.insert(id, product.clone());
        Ok(product)
    }

    /// Apply an update; lists and properties merge unless `replace` is set.
    pub fn update_product(
        &mut self,
        request: ProductUpdateRequest,
        replace: bool,
    ) -> Option<Product> {
        let product = self.products.get_mut(&request.id)?;

        if let Some(name) = request.name {
            product.name = Field::Value(name);
        }
        if let Some(family) = request.family {
            product.family = Field::Value(family);
        }
        if let Some(workspace) = request.workspace {
            product.workspace = Field::Value(workspace);
        }
        if let Some(keywords) = request.keywords {
            product.keywords = Field::Value(merge_list(&product.keywords, keywords, replace));
        }
        if let Some(file_ids) = request.file_ids {
            product.file_ids = Field::Value(merge_list(&product.file_ids, file_ids, replace));
        }
        if let Some(properties) = request.properties {
            let mut merged = match (&product.properties, replace) {
                (Field::Value(existing), false) => existing.clone(),
                _ => HashMap::new(),
            };
            merged.extend(properties);
            product.properties = Field::Value(merged);
        }
        product.updated_at = Field::Value(Utc::now());

        Some(product.clone())
    }

    /// Delete a product. Returns false if it did not exist.
    pub fn delete_product(&mut self, id: &str) -> bool {
        self.products.remove(id).is_some()
    }

    /// Products matching `filter`, in ID order unless `order_by` is given.
    pub fn query_products(
        &self,
        filter: Option<&str>,
        substitutions: &[Value],
        order_by: Option<ProductOrderBy>,
        descending: bool,
    ) -> Result<Vec<Product>, MockError> {
        let clauses = parse_filter(filter, substitutions)?;
        let mut matched: Vec<(Value, Product)> = self
            .products
            .values()
            .map(|p| (product_json(p), p))
            .filter(|(json, _)| clauses.iter().all(|(key, want)| json.get(*key) == Some(want)))
            .map(|(json, p)| (json, p.clone()))
            .collect();

        if let Some(order) = order_by {
            let key = wire_key(order.logical_name());
            matched.sort_by_key(|(json, _)| sort_key(json.get(key)));
        }
        if descending {
            matched.reverse();
        }

        Ok(matched.into_iter().map(|(_, p)| p).collect())
    }

    /// Distinct values of `field` among products matching `filter`.
    pub fn product_values(
        &self,
        field: ProductValuesField,
        filter: Option<&str>,
        substitutions: &[Value],
        starts_with: Option<&str>,
    ) -> Result<Vec<String>, MockError> {
        let key = wire_key(field.logical_name());
        let values: BTreeSet<String> = self
            .query_products(filter, substitutions, None, false)?
            .iter()
            .filter_map(|p| product_json(p).get(key).and_then(Value::as_str).map(str::to_string))
            .filter(|v| starts_with.map_or(true, |prefix| v.starts_with(prefix)))
            .collect();
        Ok(values.into_iter().collect())
    }

    // =========================================================================
    // Feeds
    // =========================================================================

    /// List feeds, optionally filtered by platform and workspace.
    pub fn list_feeds(&self, platform: Option<Platform>, workspace: Option<&str>) -> Vec<&Feed> {
        self.feeds
            .values()
            .filter(|f| platform.map_or(true, |p| f.platform == p))
            .filter(|f| workspace.map_or(true, |w| f.workspace.as_deref() == Some(w)))
            .collect()
    }

    /// Create a feed in the requested or default workspace.
    pub fn create_feed(&mut self, request: CreateFeedRequest) -> Feed {
        let now = Utc::now();
        let feed = Feed {
            id: self.next_id("feed"),
            name: request.name,
            description: request.description,
            platform: request.platform,
            workspace: request.workspace.or_else(|| self.default_workspace()),
            updated_by: None,
            updated_at: Some(now),
            created_by: None,
            created_at: Some(now),
            package_sources: Vec::new(),
            deleted: false,
        };
        self.feeds.insert(feed.id.clone(), feed.clone());
        feed
    }

    /// Store an uploaded package.
    pub fn add_package(
        &mut self,
        feed_id: &str,
        file_name: &str,
        overwrite: bool,
    ) -> Result<Package, MockError> {
        let feed = self
            .feeds
            .get(feed_id)
            .ok_or_else(|| MockError::NotFound(format!("Feed '{feed_id}' not found.")))?;
        let workspace = feed.workspace.clone();

        let id = self.next_id("package");
        let packages = self.packages.entry(feed_id.to_string()).or_default();
        if let Some(pos) = packages.iter().position(|p| p.file_name == file_name) {
            if !overwrite {
                return Err(MockError::Conflict(format!(
                    "DuplicatePackageError: '{file_name}' already exists in the feed."
                )));
            }
            packages.remove(pos);
        }

        let now = Utc::now();
        let package = Package {
            id: Some(id),
            file_name: file_name.to_string(),
            feed_id: Some(feed_id.to_string()),
            workspace,
            updated_at: Some(now),
            created_at: Some(now),
            metadata: None,
        };
        packages.push(package.clone());
        Ok(package)
    }

    /// Delete a feed and its packages. Returns false if it did not exist.
    pub fn delete_feed(&mut self, feed_id: &str) -> bool {
        self.packages.remove(feed_id);
        self.feeds.remove(feed_id).is_some()
    }
}

fn merge_list(existing: &Field<Vec<String>>, incoming: Vec<String>, replace: bool) -> Vec<String> {
    let mut merged = match (existing, replace) {
        (Field::Value(current), false) => current.clone(),
        _ => Vec::new(),
    };
    for item in incoming {
        if !merged.contains(&item) {
            merged.push(item);
        }
    }
    merged
}

fn product_json(product: &Product) -> Value {
    serde_json::to_value(product).unwrap_or(Value::Null)
}

fn wire_key(logical: &str) -> &'static str {
    Product::logical_to_wire(logical).unwrap_or("id")
}

fn sort_key(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

/// Parse `field == @N` clauses joined by `&&`.
fn parse_filter(filter: Option<&str>, substitutions: &[Value]) -> Result<Vec<Clause>, MockError> {
    let Some(filter) = filter.map(str::trim).filter(|f| !f.is_empty()) else {
        return Ok(Vec::new());
    };

    filter
        .split("&&")
        .map(|clause| {
            let (lhs, rhs) = clause.split_once("==").ok_or_else(|| {
                MockError::BadRequest(format!("unsupported filter clause '{}'", clause.trim()))
            })?;

            let field: ProductField = lhs
                .trim()
                .parse()
                .map_err(|_| MockError::BadRequest(format!("unknown field '{}'", lhs.trim())))?;

            let index: usize = rhs
                .trim()
                .strip_prefix('@')
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| {
                    MockError::BadRequest(format!("expected a placeholder, got '{}'", rhs.trim()))
                })?;

            let value = substitutions
                .get(index)
                .cloned()
                .ok_or_else(|| MockError::BadRequest(format!("no substitution for @{index}")))?;

            Ok((wire_key(field.logical_name()), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(part_number: &str, family: &str) -> ProductRequest {
        ProductRequest {
            family: Some(family.to_string()),
            ..ProductRequest::new(part_number)
        }
    }

    #[test]
    fn test_state_create_and_reject_duplicate() {
        let mut state = MockState::new().with_product(product("A", "F"));
        assert_eq!(state.products.len(), 1);

        let err = state.create_product(product("A", "G")).unwrap_err();
        assert!(matches!(err, MockError::Conflict(_)));

        let err = state.create_product(product(" ", "G")).unwrap_err();
        assert!(matches!(err, MockError::BadRequest(_)));
    }

    #[test]
    fn test_state_query_with_filter() {
        let state = MockState::new()
            .with_product(product("A", "F"))
            .with_product(product("B", "G"))
            .with_product(product("C", "F"));

        let all = state.query_products(None, &[], None, false).unwrap();
        assert_eq!(all.len(), 3);

        let family = state
            .query_products(Some("family == @0"), &[json!("F")], None, false)
            .unwrap();
        assert_eq!(family.len(), 2);

        let both = state
            .query_products(
                Some("family == @0 && partNumber == @1"),
                &[json!("F"), json!("C")],
                Some(ProductOrderBy::PartNumber),
                true,
            )
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].part_number(), Some("C"));

        let bad = state.query_products(Some("family > @0"), &[json!("F")], None, false);
        assert!(matches!(bad, Err(MockError::BadRequest(_))));
    }

    #[test]
    fn test_state_update_merge_and_replace() {
        let mut state = MockState::new().with_product(ProductRequest {
            keywords: Some(vec!["a".to_string()]),
            ..ProductRequest::new("A")
        });
        let id = state.products.keys().next().unwrap().clone();

        let mut request = ProductUpdateRequest::new(id.clone());
        request.keywords = Some(vec!["b".to_string()]);
        let merged = state.update_product(request.clone(), false).unwrap();
        assert_eq!(merged.keywords, Field::Value(vec!["a".to_string(), "b".to_string()]));

        let replaced = state.update_product(request, true).unwrap();
        assert_eq!(replaced.keywords, Field::Value(vec!["b".to_string()]));

        assert!(state.update_product(ProductUpdateRequest::new("missing"), false).is_none());
    }

    #[test]
    fn test_state_product_values() {
        let state = MockState::new()
            .with_product(product("A", "Fuses"))
            .with_product(product("B", "Fans"))
            .with_product(product("C", "Fuses"));

        let values = state
            .product_values(ProductValuesField::Family, None, &[], Some("Fu"))
            .unwrap();
        assert_eq!(values, vec!["Fuses"]);
    }

    #[test]
    fn test_state_packages() {
        let mut state =
            MockState::new().with_feed(CreateFeedRequest::new("feed", Platform::Windows));
        let feed_id = state.feeds.keys().next().unwrap().clone();

        state.add_package(&feed_id, "a.nipkg", false).unwrap();
        let dup = state.add_package(&feed_id, "a.nipkg", false);
        assert!(matches!(dup, Err(MockError::Conflict(_))));
        assert!(state.add_package(&feed_id, "a.nipkg", true).is_ok());
        assert_eq!(state.packages[&feed_id].len(), 1);

        assert!(matches!(state.add_package("nope", "a.nipkg", false), Err(MockError::NotFound(_))));
        assert!(state.delete_feed(&feed_id));
        assert!(!state.delete_feed(&feed_id));
    }
}
