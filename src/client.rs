//! SystemLink API client.
//!
//! Low-level HTTP client that handles authentication and raw requests.
//! Endpoint operations live with their models and take the client as an
//! injected dependency.

use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::HttpConfiguration;
use crate::error::{ApiError, Result, SystemLinkError};

const USER_AGENT: &str = concat!("systemlink-rs/", env!("CARGO_PKG_VERSION"));
const API_KEY_HEADER: &str = "x-ni-api-key";

/// Low-level SystemLink API client.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use systemlink::SystemLinkClient;
///
/// # fn example() -> systemlink::Result<()> {
/// // Create from environment variables
/// let client = SystemLinkClient::from_env()?;
///
/// // Or configure manually
/// let client = SystemLinkClient::new("your-api-key", "https://my-server.example.com")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SystemLinkClient {
    http: Client,
    base_url: Arc<Url>,
    api_key: Option<String>,
}

impl std::fmt::Debug for SystemLinkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemLinkClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl SystemLinkClient {
    /// Create a client from `SYSTEMLINK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `SYSTEMLINK_API_KEY` is not set.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&HttpConfiguration::from_env()?)
    }

    /// Create a new client with the provided API key and server URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URI is invalid.
    pub fn new(api_key: &str, server_uri: &str) -> Result<Self> {
        Self::from_config(&HttpConfiguration::new(server_uri, api_key))
    }

    /// Create a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URI is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &HttpConfiguration) -> Result<Self> {
        // Ensure base URL ends with /
        let base_url_str = if config.server_uri.ends_with('/') {
            config.server_uri.clone()
        } else {
            format!("{}/", config.server_uri)
        };

        let base_url = Url::parse(&base_url_str)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(config.timeout)
            .build()
            .map_err(SystemLinkError::HttpError)?;

        Ok(Self {
            http,
            base_url: Arc::new(base_url),
            api_key: config.api_key.clone(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Make a GET request.
    #[tracing::instrument(skip(self))]
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self.base_url.join(path)?;

        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(SystemLinkError::HttpError)?;

        Self::check_response(response).await
    }

    /// Make a GET request with query parameters.
    #[tracing::instrument(skip(self, query))]
    pub async fn get_with_query<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<Response> {
        let url = self.base_url.join(path)?;

        let response = self
            .authorize(self.http.get(url))
            .query(query)
            .send()
            .await
            .map_err(SystemLinkError::HttpError)?;

        Self::check_response(response).await
    }

    /// Make a POST request with JSON body.
    #[tracing::instrument(skip(self, body))]
    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        let url = self.base_url.join(path)?;

        let response = self
            .authorize(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(SystemLinkError::HttpError)?;

        Self::check_response(response).await
    }

    /// Make a multipart POST request with query parameters.
    #[tracing::instrument(skip(self, query, form))]
    pub async fn post_multipart<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        form: Form,
    ) -> Result<Response> {
        let url = self.base_url.join(path)?;

        let response = self
            .authorize(self.http.post(url))
            .query(query)
            .multipart(form)
            .send()
            .await
            .map_err(SystemLinkError::HttpError)?;

        Self::check_response(response).await
    }

    /// Make a DELETE request.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<Response> {
        let url = self.base_url.join(path)?;

        let response = self
            .authorize(self.http.delete(url))
            .send()
            .await
            .map_err(SystemLinkError::HttpError)?;

        Self::check_response(response).await
    }

    /// Read a successful response body as raw JSON.
    pub(crate) async fn json_value(response: Response) -> Result<serde_json::Value> {
        response.json().await.map_err(SystemLinkError::HttpError)
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        // Handle rate limiting
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(SystemLinkError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let (message, error) = Self::extract_error(response, status).await;
        Err(SystemLinkError::Api {
            status_code: status.as_u16(),
            message,
            error: error.map(Box::new),
        })
    }

    /// Extract the message and structured payload from a failed response.
    async fn extract_error(
        response: Response,
        status: reqwest::StatusCode,
    ) -> (String, Option<ApiError>) {
        let status_line = format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );

        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => return (status_line, None),
        };

        #[derive(Deserialize)]
        struct ErrorEnvelope {
            error: ApiError,
        }

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            let message = match &envelope.error.message {
                Some(msg) => format!("{status_line}: {msg}"),
                None => status_line,
            };
            return (message, Some(envelope.error));
        }

        // Some services send a bare message field
        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(msg) = json.get("message").and_then(|m| m.as_str()) {
                return (format!("{status_line}: {msg}"), None);
            }
        }

        if body.trim().is_empty() {
            (status_line, None)
        } else {
            (format!("{status_line}: {body}"), None)
        }
    }
}
