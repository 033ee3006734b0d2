//! Product query construction and validation.
//!
//! Filters use the server's expression language with positional
//! placeholders (`family == @0 && name == @1`). Values for the placeholders
//! travel separately in `substitutions`, so nothing user-supplied is ever
//! spliced into the expression text.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SystemLinkError};
use crate::pagination::ContinuationQuery;

/// Largest page the product endpoints accept.
pub const MAX_TAKE: u32 = 1000;

static STRING_LITERAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).expect("string literal pattern is valid"));

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@(\d+)").expect("placeholder pattern is valid"));

/// Distinct placeholder indices referenced by `filter`.
///
/// Text inside double-quoted string literals is ignored.
pub fn referenced_placeholders(filter: &str) -> Result<BTreeSet<usize>> {
    let code = STRING_LITERAL_REGEX.replace_all(filter, "\"\"");
    PLACEHOLDER_REGEX
        .captures_iter(&code)
        .map(|cap| {
            cap[1].parse::<usize>().map_err(|_| {
                SystemLinkError::Validation(format!("placeholder @{} is out of range", &cap[1]))
            })
        })
        .collect()
}

/// Check that `filter` and `substitutions` agree.
pub(crate) fn validate_substitutions(filter: Option<&str>, substitutions: usize) -> Result<()> {
    let referenced = match filter {
        Some(f) => referenced_placeholders(f)?,
        None => BTreeSet::new(),
    };

    if referenced.len() != substitutions {
        return Err(SystemLinkError::Validation(format!(
            "filter references {} placeholder(s) but {} substitution(s) were given",
            referenced.len(),
            substitutions
        )));
    }

    if let Some(missing) = referenced.iter().find(|i| **i >= substitutions) {
        return Err(SystemLinkError::Validation(format!(
            "placeholder @{missing} has no matching substitution"
        )));
    }

    Ok(())
}

fn validate_take(take: i64) -> Result<u32> {
    if take < 0 {
        return Err(SystemLinkError::Validation(format!(
            "take must not be negative, got {take}"
        )));
    }
    match u32::try_from(take) {
        Ok(t) if t <= MAX_TAKE => Ok(t),
        _ => Err(SystemLinkError::Validation(format!(
            "take must be at most {MAX_TAKE}, got {take}"
        ))),
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $wire:literal, $logical:literal;)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name used on the wire (e.g. `PART_NUMBER`).
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Matching product attribute name (e.g. `part_number`).
            pub fn logical_name(&self) -> &'static str {
                match self {
                    $($name::$variant => $logical,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SystemLinkError;

            /// Accepts `PART_NUMBER`, `part_number` or `partNumber`.
            fn from_str(s: &str) -> Result<Self> {
                let wanted = normalize(s);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| normalize(v.as_str()) == wanted)
                    .ok_or_else(|| {
                        SystemLinkError::Validation(format!(
                            "unknown {} '{}'",
                            stringify!($name),
                            s
                        ))
                    })
            }
        }
    };
}

field_enum! {
    /// Product fields a query can project.
    ProductField {
        Id => "ID", "id";
        PartNumber => "PART_NUMBER", "part_number";
        Name => "NAME", "name";
        Family => "FAMILY", "family";
        UpdatedAt => "UPDATED_AT", "updated_at";
        FileIds => "FILE_IDS", "file_ids";
        Keywords => "KEYWORDS", "keywords";
        Properties => "PROPERTIES", "properties";
        Workspace => "WORKSPACE", "workspace";
    }
}

field_enum! {
    /// Product fields a query can be ordered by.
    ProductOrderBy {
        Id => "ID", "id";
        PartNumber => "PART_NUMBER", "part_number";
        Name => "NAME", "name";
        Family => "FAMILY", "family";
        UpdatedAt => "UPDATED_AT", "updated_at";
    }
}

field_enum! {
    /// Product fields whose distinct values can be listed.
    ProductValuesField {
        Id => "ID", "id";
        PartNumber => "PART_NUMBER", "part_number";
        Name => "NAME", "name";
        Family => "FAMILY", "family";
    }
}

/// A validated `query-products` request.
///
/// Built with [`ProductQuery::builder`]; the builder rejects malformed
/// queries before anything is sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    substitutions: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<ProductOrderBy>,
    descending: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    projection: Vec<ProductField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    take: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation_token: Option<String>,
    return_count: bool,
}

impl ProductQuery {
    /// Start building a query.
    pub fn builder() -> ProductQueryBuilder {
        ProductQueryBuilder::default()
    }

    /// Filter expression.
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Placeholder values.
    pub fn substitutions(&self) -> &[serde_json::Value] {
        &self.substitutions
    }

    /// Ordering field.
    pub fn order_by(&self) -> Option<ProductOrderBy> {
        self.order_by
    }

    /// Whether ordering is descending.
    pub fn descending(&self) -> bool {
        self.descending
    }

    /// Projected fields; empty means all fields.
    pub fn projection(&self) -> &[ProductField] {
        &self.projection
    }

    /// Page size.
    pub fn take(&self) -> Option<u32> {
        self.take
    }

    /// Same query resumed at `token`.
    #[must_use]
    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

impl ContinuationQuery for ProductQuery {
    fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    fn set_continuation_token(&mut self, token: Option<String>) {
        self.continuation_token = token;
    }

    fn return_count(&self) -> bool {
        self.return_count
    }

    fn set_return_count(&mut self, return_count: bool) {
        self.return_count = return_count;
    }
}

/// Builder for [`ProductQuery`].
///
/// Setters never fail; problems are collected and reported by
/// [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct ProductQueryBuilder {
    query: ProductQuery,
    take: Option<i64>,
    errors: Vec<String>,
}

impl ProductQueryBuilder {
    /// Filter expression with `@N` placeholders.
    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.query.filter = Some(filter.into());
        self
    }

    /// Append one placeholder value.
    #[must_use]
    pub fn substitution(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.query.substitutions.push(value.into());
        self
    }

    /// Append several placeholder values.
    #[must_use]
    pub fn substitutions<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        self.query
            .substitutions
            .extend(values.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: ProductOrderBy) -> Self {
        self.query.order_by = Some(field);
        self
    }

    /// Order by a field given by name.
    #[must_use]
    pub fn order_by_name(mut self, name: &str) -> Self {
        match name.parse() {
            Ok(field) => self.query.order_by = Some(field),
            Err(e) => self.errors.push(e.to_string()),
        }
        self
    }

    #[must_use]
    pub fn descending(mut self, descending: bool) -> Self {
        self.query.descending = descending;
        self
    }

    /// Add a field to the projection. Duplicates are ignored.
    #[must_use]
    pub fn project(mut self, field: ProductField) -> Self {
        if !self.query.projection.contains(&field) {
            self.query.projection.push(field);
        }
        self
    }

    /// Add projection fields given by name.
    #[must_use]
    pub fn project_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            match name.as_ref().parse() {
                Ok(field) => self = self.project(field),
                Err(e) => self.errors.push(e.to_string()),
            }
        }
        self
    }

    /// Maximum number of products per page.
    #[must_use]
    pub fn take(mut self, take: i64) -> Self {
        self.take = Some(take);
        self
    }

    /// Resume from a token returned by an earlier page.
    #[must_use]
    pub fn continuation_token(mut self, token: impl Into<String>) -> Self {
        self.query.continuation_token = Some(token.into());
        self
    }

    /// Ask the server for the total number of matches.
    #[must_use]
    pub fn return_count(mut self, return_count: bool) -> Self {
        self.query.return_count = return_count;
        self
    }

    /// Validate and produce the query.
    ///
    /// # Errors
    ///
    /// Returns [`SystemLinkError::Validation`] if a field name was unknown,
    /// `take` is negative or above [`MAX_TAKE`], or the substitutions do not
    /// match the placeholders in the filter.
    pub fn build(self) -> Result<ProductQuery> {
        if let Some(first) = self.errors.into_iter().next() {
            return Err(SystemLinkError::Validation(first));
        }

        let mut query = self.query;
        query.take = self.take.map(validate_take).transpose()?;
        validate_substitutions(query.filter.as_deref(), query.substitutions.len())?;

        Ok(query)
    }
}

/// Parameters of the `GET products` listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    /// Maximum number of products per page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub take: Option<u32>,

    /// Token from the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,

    /// Ask for the total number of products.
    pub return_count: bool,
}

impl ProductListQuery {
    /// Check the page size.
    pub fn validate(&self) -> Result<()> {
        if let Some(take) = self.take {
            validate_take(i64::from(take))?;
        }
        Ok(())
    }
}

impl ContinuationQuery for ProductListQuery {
    fn continuation_token(&self) -> Option<&str> {
        self.continuation_token.as_deref()
    }

    fn set_continuation_token(&mut self, token: Option<String>) {
        self.continuation_token = token;
    }

    fn return_count(&self) -> bool {
        self.return_count
    }

    fn set_return_count(&mut self, return_count: bool) {
        self.return_count = return_count;
    }
}

/// Request for the distinct values of one product field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductValuesQuery {
    /// Field whose values are listed.
    pub field: ProductValuesField,

    /// Optional filter restricting the products considered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,

    /// Placeholder values for `filter`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub substitutions: Vec<serde_json::Value>,

    /// Only return values starting with this prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_with: Option<String>,
}

impl ProductValuesQuery {
    pub fn new(field: ProductValuesField) -> Self {
        Self {
            field,
            filter: None,
            substitutions: Vec::new(),
            starts_with: None,
        }
    }

    /// Restrict to products matching `filter`.
    #[must_use]
    pub fn with_filter<I, V>(mut self, filter: impl Into<String>, substitutions: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<serde_json::Value>,
    {
        self.filter = Some(filter.into());
        self.substitutions = substitutions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn starts_with(mut self, prefix: impl Into<String>) -> Self {
        self.starts_with = Some(prefix.into());
        self
    }

    /// Check that the filter and substitutions agree.
    pub fn validate(&self) -> Result<()> {
        validate_substitutions(self.filter.as_deref(), self.substitutions.len())
    }
}
