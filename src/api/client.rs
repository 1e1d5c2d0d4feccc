use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::{
    CategoryNode, CategoryPayload, NewCategory, Post, PostPayload, TagPayload, TagType,
};
use crate::util::{validate_base_url, UrlValidationError};

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const MAX_RETRIES: u32 = 3;
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("No auth token configured; refusing to send an authenticated request")]
    MissingToken,
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid UTF-8 in response")]
    InvalidUtf8,
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Insecure base URL: HTTPS required (except localhost)")]
    InsecureBaseUrl,
}

impl ApiError {
    /// Transient failures worth retrying for idempotent requests.
    fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout(_) | ApiError::Network(_) => true,
            ApiError::HttpStatus { status, .. } => *status >= 500,
            ApiError::MissingToken
            | ApiError::ResponseTooLarge(_)
            | ApiError::InvalidUtf8
            | ApiError::Decode(_)
            | ApiError::InvalidUrl(_)
            | ApiError::InsecureBaseUrl => false,
        }
    }
}

impl From<UrlValidationError> for ApiError {
    fn from(err: UrlValidationError) -> Self {
        match err {
            UrlValidationError::Insecure => ApiError::InsecureBaseUrl,
            other => ApiError::InvalidUrl(other.to_string()),
        }
    }
}

/// Connection settings, passed in explicitly instead of read from globals.
#[derive(Debug)]
pub struct ApiConfig {
    pub base_url: String,
    /// Bearer token for mutating calls.
    pub auth_token: Option<SecretString>,
    pub timeout: Duration,
}

/// Typed client for the blog REST API.
///
/// Reads are unauthenticated and retried on transient failures (timeouts,
/// network errors, 5xx) with exponential backoff. Mutations send the bearer
/// token, fail with [`ApiError::MissingToken`] before any I/O when no token
/// is configured, and are never retried.
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<SecretString>,
    timeout: Duration,
    retry_delay: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.base.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rapydo/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Self::with_client(http, config)
    }

    /// Uses a caller-provided `reqwest::Client` (shared pools, custom TLS).
    pub fn with_client(http: reqwest::Client, config: ApiConfig) -> Result<Self, ApiError> {
        let base = validate_base_url(&config.base_url)?;
        if config.auth_token.is_none() {
            tracing::debug!("No auth token configured, mutating calls are disabled");
        }
        Ok(Self {
            http,
            base,
            token: config.auth_token,
            timeout: config.timeout,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// First retry delay; doubles on each further attempt.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    // ========================================================================
    // Categories
    // ========================================================================

    pub async fn categories(&self) -> Result<Vec<Arc<CategoryNode>>, ApiError> {
        self.get_json(self.endpoint("categories")?).await
    }

    /// Sent as form fields, which is what the server's create route reads.
    pub async fn create_category(&self, category: &NewCategory) -> Result<CategoryNode, ApiError> {
        self.send_body(
            Method::POST,
            self.endpoint("categories")?,
            "application/x-www-form-urlencoded",
            category.form_body().into_bytes(),
        )
        .await
    }

    pub async fn update_category(
        &self,
        id: i64,
        payload: &CategoryPayload,
    ) -> Result<CategoryNode, ApiError> {
        self.send_json(Method::PUT, self.endpoint(&format!("categories/{id}"))?, payload)
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), ApiError> {
        self.delete(self.endpoint(&format!("categories/{id}"))?).await
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// Every post. The server answers 404 when there are none; that is an
    /// empty list here.
    pub async fn posts(&self) -> Result<Vec<Post>, ApiError> {
        empty_when_not_found(self.get_json(self.endpoint("posts")?).await)
    }

    /// Posts in any of `category_ids` (`GET /posts?categories=a&categories=b`).
    /// An empty id list returns no posts without a request, and a 404 (no
    /// posts in those categories) is an empty list.
    pub async fn posts_in_categories(&self, category_ids: &[i64]) -> Result<Vec<Post>, ApiError> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut url = self.endpoint("posts")?;
        {
            let mut query = url.query_pairs_mut();
            for id in category_ids {
                query.append_pair("categories", &id.to_string());
            }
        }
        empty_when_not_found(self.get_json(url).await)
    }

    pub async fn post(&self, id: i64) -> Result<Post, ApiError> {
        self.get_json(self.endpoint(&format!("posts/{id}"))?).await
    }

    pub async fn create_post(&self, payload: &PostPayload) -> Result<Post, ApiError> {
        self.send_json(Method::POST, self.endpoint("posts")?, payload)
            .await
    }

    pub async fn update_post(&self, id: i64, payload: &PostPayload) -> Result<Post, ApiError> {
        self.send_json(Method::PUT, self.endpoint(&format!("posts/{id}"))?, payload)
            .await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ApiError> {
        self.delete(self.endpoint(&format!("posts/{id}"))?).await
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub async fn tags(&self) -> Result<Vec<TagType>, ApiError> {
        self.get_json(self.endpoint("tags")?).await
    }

    pub async fn create_tag(&self, payload: &TagPayload) -> Result<TagType, ApiError> {
        self.send_json(Method::POST, self.endpoint("tags")?, payload)
            .await
    }

    pub async fn update_tag(&self, id: i64, payload: &TagPayload) -> Result<TagType, ApiError> {
        self.send_json(Method::PUT, self.endpoint(&format!("tags/{id}"))?, payload)
            .await
    }

    pub async fn delete_tag(&self, id: i64) -> Result<(), ApiError> {
        self.delete(self.endpoint(&format!("tags/{id}"))?).await
    }

    // ========================================================================
    // Plumbing
    // ========================================================================

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let token = self.token.as_ref().ok_or(ApiError::MissingToken)?;
        Ok(request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret())))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut retry_count = 0;
        let body = loop {
            match self.execute(self.http.get(url.clone())).await {
                Ok(body) => break body,
                Err(e) if e.is_retryable() && retry_count < MAX_RETRIES => {
                    let delay = self.retry_delay * (1u32 << retry_count);
                    tracing::debug!(
                        url = %url,
                        error = %e,
                        retry = retry_count + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying GET after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    retry_count += 1;
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "GET failed");
                    return Err(e);
                }
            }
        };
        decode(&body)
    }

    async fn send_json<B, T>(&self, method: Method, url: Url, payload: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(payload)?;
        self.send_body(method, url, "application/json", body).await
    }

    async fn send_body<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        content_type: &'static str,
        body: Vec<u8>,
    ) -> Result<T, ApiError> {
        let request = self
            .authorize(self.http.request(method.clone(), url.clone()))?
            .header(CONTENT_TYPE, content_type)
            .body(body);

        tracing::debug!(method = %method, url = %url, content_type, "Sending authenticated request");
        let body = self.execute(request).await.inspect_err(|e| {
            tracing::warn!(method = %method, url = %url, error = %e, "Request failed");
        })?;
        decode(&body)
    }

    async fn delete(&self, url: Url) -> Result<(), ApiError> {
        let request = self.authorize(self.http.delete(url.clone()))?;
        tracing::debug!(url = %url, "Sending DELETE");
        // Any response body is ignored.
        self.execute(request).await.map(|_| ()).inspect_err(|e| {
            tracing::warn!(url = %url, error = %e, "DELETE failed");
        })
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, ApiError> {
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(self.timeout))??;

        let status = response.status();
        if !status.is_success() {
            let body = read_limited_text(response, MAX_RESPONSE_SIZE)
                .await
                .unwrap_or_default();
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        read_limited_text(response, MAX_RESPONSE_SIZE).await
    }
}

/// JSON decoding without serde_json's nesting limit. Category trees have no
/// depth bound, so the parser grows its stack on demand instead.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let mut json = serde_json::Deserializer::from_str(body);
    json.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut json))?;
    json.end()?;
    Ok(value)
}

fn empty_when_not_found<T>(result: Result<Vec<T>, ApiError>) -> Result<Vec<T>, ApiError> {
    match result {
        Err(ApiError::HttpStatus { status: 404, .. }) => {
            tracing::debug!("Server reported no posts");
            Ok(Vec::new())
        }
        other => other,
    }
}

async fn read_limited_text(response: reqwest::Response, limit: usize) -> Result<String, ApiError> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    String::from_utf8(bytes).map_err(|_| ApiError::InvalidUtf8)
}
