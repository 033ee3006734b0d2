//! Continuation-token pagination.
//!
//! SystemLink paged endpoints hand back an opaque continuation token with
//! each page; the next page is requested by sending that token back. A
//! missing token means the result set is exhausted.
//!
//! [`Paginator`] drives that loop for any [`PageSource`], either page by page
//! ([`Paginator::next_page`]) or all at once ([`fetch_all`]).

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SystemLinkError};

/// A page of results from a SystemLink paged endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Token for the next page; `None` on the last page.
    #[serde(default)]
    pub continuation_token: Option<String>,
    /// Total number of matching items, when the query asked for it.
    #[serde(default)]
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Create a new page from items and pagination info.
    #[must_use]
    pub fn new(
        items: Vec<T>,
        continuation_token: Option<String>,
        total_count: Option<u64>,
    ) -> Self {
        Self {
            items,
            continuation_token,
            total_count,
        }
    }

    /// Whether another page follows this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }

    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            continuation_token: self.continuation_token,
            total_count: self.total_count,
        }
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A request that can be resumed with a continuation token.
pub trait ContinuationQuery {
    /// Token the request resumes from.
    fn continuation_token(&self) -> Option<&str>;

    /// Point the request at another page.
    fn set_continuation_token(&mut self, token: Option<String>);

    /// Whether the request asks the server for the total count.
    fn return_count(&self) -> bool;

    /// Toggle the total-count request.
    fn set_return_count(&mut self, return_count: bool);
}

/// Anything that can fetch one page for a query.
///
/// Endpoint adapters implement this over HTTP; tests implement it over
/// in-memory data.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Item type of each page.
    type Item: Send;

    /// Query type understood by the source.
    type Query: ContinuationQuery + Clone + Send + Sync;

    /// Fetch the page the query points at.
    async fn fetch_page(&self, query: &Self::Query) -> Result<Page<Self::Item>>;
}

/// Single-pass, page-at-a-time walk over a paged result set.
///
/// Each call to [`next_page`](Self::next_page) waits for its request to
/// finish before the next token is known, so pages are fetched strictly in
/// order. Once the final page or an error has been yielded the paginator is
/// exhausted; start over with a fresh query to re-read the results.
pub struct Paginator<'s, S: PageSource> {
    source: &'s S,
    query: S::Query,
    total_count: Option<u64>,
    count_requested: bool,
    seen_tokens: HashSet<String>,
    pages_fetched: u32,
    done: bool,
}

impl<'s, S: PageSource> std::fmt::Debug for Paginator<'s, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Paginator")
            .field("token", &self.query.continuation_token())
            .field("total_count", &self.total_count)
            .field("pages_fetched", &self.pages_fetched)
            .field("done", &self.done)
            .finish()
    }
}

impl<'s, S: PageSource> Paginator<'s, S> {
    /// Start paging `source` from wherever `query` points.
    pub fn new(source: &'s S, query: S::Query) -> Self {
        Self {
            source,
            count_requested: query.return_count(),
            query,
            total_count: None,
            seen_tokens: HashSet::new(),
            pages_fetched: 0,
            done: false,
        }
    }

    /// Total count reported by the server so far, if requested.
    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    /// Number of requests issued so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Whether no further pages will be yielded.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page.
    ///
    /// Returns `None` once the result set is exhausted or after an error has
    /// been returned.
    pub async fn next_page(&mut self) -> Option<Result<Page<S::Item>>> {
        if self.done {
            return None;
        }

        if let Some(sent) = self.query.continuation_token() {
            self.seen_tokens.insert(sent.to_owned());
        }
        let result = self.source.fetch_page(&self.query).await;
        self.pages_fetched += 1;

        let mut page = match result {
            Ok(page) => page,
            Err(err) => {
                self.done = true;
                return Some(Err(err));
            }
        };

        if !self.count_requested {
            page.total_count = None;
        } else if let Some(known) = self.total_count {
            page.total_count = Some(known);
        } else if let Some(count) = page.total_count {
            self.total_count = Some(count);
            // Count is fixed for the session; don't ask again
            self.query.set_return_count(false);
        }

        match &page.continuation_token {
            Some(token) if self.seen_tokens.contains(token) => {
                tracing::warn!(token = %token, "Server returned a token already followed");
                self.done = true;
                return Some(Err(SystemLinkError::StalledPagination {
                    token: token.clone(),
                }));
            }
            Some(token) => {
                tracing::debug!(
                    page = self.pages_fetched,
                    items = page.items.len(),
                    "Fetched page, more available"
                );
                self.query.set_continuation_token(Some(token.clone()));
            }
            None => {
                tracing::debug!(
                    page = self.pages_fetched,
                    items = page.items.len(),
                    "Fetched final page"
                );
                self.done = true;
            }
        }

        Some(Ok(page))
    }

    /// Drain the remaining pages into one list.
    ///
    /// Items gathered before an error are dropped; the error is returned.
    pub async fn collect_all(mut self) -> Result<Vec<S::Item>> {
        let mut all_items = Vec::new();
        while let Some(page) = self.next_page().await {
            all_items.extend(page?.items);
        }
        Ok(all_items)
    }
}

/// Fetch every remaining item for `query`, following continuation tokens.
///
/// # Errors
///
/// Returns the first error raised by the source; no partial results are
/// returned.
pub async fn fetch_all<S: PageSource>(source: &S, query: S::Query) -> Result<Vec<S::Item>> {
    Paginator::new(source, query).collect_all().await
}

/// Walk the result set for `query` one page at a time.
pub fn fetch_pages<S: PageSource>(source: &S, query: S::Query) -> Paginator<'_, S> {
    Paginator::new(source, query)
}
