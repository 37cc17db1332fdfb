//! REST client for a remote document API.
//!
//! ```text
//! create       POST   {base}/api/{collection}
//! update       PATCH  {base}/api/{collection}/{id}
//! find_by_id   GET    {base}/api/{collection}/{id}
//! find         GET    {base}/api/{collection}?where[..]&limit=..
//! ```
//!
//! Writes answer `{ "doc": {..} }`, finds answer `{ "docs": [..] }`. Failures
//! answer `{ "errors": [{ "message", "data": { "errors": [..] } }] }`.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::{Document, DocumentStore, FindResult, Query};
use crate::error::{FieldError, StoreError, StoreResult};
use crate::Record;

/// Longest response excerpt kept in error messages.
const MAX_ERROR_BODY: usize = 500;

/// Error response body
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiError>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<ApiErrorData>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorData {
    #[serde(default)]
    errors: Vec<FieldError>,
}

/// Document store client
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    base_url: String,
    authorization: Option<String>,
    default_locale: Option<String>,
}

impl HttpStore {
    /// Client for the API served at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization: None,
            default_locale: None,
        }
    }

    /// Send this `Authorization` header value with every request
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = Some(locale.into());
        self
    }

    fn url(&self, collection: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/api/{}/{}", self.base_url, collection, id),
            None => format!("{}/api/{}", self.base_url, collection),
        }
    }

    fn request(&self, method: Method, url: String, locale: Option<&str>) -> RequestBuilder {
        let mut request = self.client.request(method, url).query(&[("depth", "0")]);
        if let Some(locale) = locale {
            request = request.query(&[("locale", locale)]);
        }
        if let Some(authorization) = &self.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, authorization);
        }
        request
    }

    /// Send a request and return the status and raw body
    async fn send(&self, request: RequestBuilder) -> StoreResult<(StatusCode, String)> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok((status, body))
    }

    async fn write(&self, request: RequestBuilder) -> StoreResult<Document> {
        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        extract_doc(&body)
    }
}

/// Map a failed response to a store error.
fn error_from_body(status: StatusCode, body: &str) -> StoreError {
    let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) else {
        return StoreError::Rejected(format!("HTTP {}: {}", status, excerpt(body)));
    };

    let first = parsed.errors.into_iter().next();
    let message = first
        .as_ref()
        .and_then(|e| e.message.clone())
        .or(parsed.message)
        .unwrap_or_else(|| format!("HTTP {}", status));
    let field_errors = first
        .and_then(|e| e.data)
        .map(|d| d.errors)
        .unwrap_or_default();

    if field_errors.is_empty() {
        StoreError::Rejected(message)
    } else {
        StoreError::Validation { message, errors: field_errors }
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

/// The document of a write response, `{ "doc": .. }` or the bare document.
fn extract_doc(body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<Value>(body)? {
        Value::Object(mut object) => match object.remove("doc") {
            Some(Value::Object(doc)) => Ok(doc),
            Some(_) => Err(StoreError::Rejected("Response document is not an object".to_string())),
            None => Ok(object),
        },
        _ => Err(StoreError::Rejected("Response is not an object".to_string())),
    }
}

#[async_trait]
impl DocumentStore for HttpStore {
    async fn create(&self, collection: &str, data: Record, locale: Option<&str>) -> StoreResult<Document> {
        let request = self
            .request(Method::POST, self.url(collection, None), locale)
            .json(&data);
        self.write(request).await
    }

    async fn update(
        &self,
        id: &str,
        collection: &str,
        data: Record,
        locale: Option<&str>,
    ) -> StoreResult<Document> {
        let request = self
            .request(Method::PATCH, self.url(collection, Some(id)), locale)
            .json(&data);
        let (status, body) = self.send(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        extract_doc(&body)
    }

    async fn find_by_id(
        &self,
        id: &str,
        collection: &str,
        locale: Option<&str>,
    ) -> StoreResult<Option<Document>> {
        let request = self.request(Method::GET, self.url(collection, Some(id)), locale);
        let (status, body) = self.send(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        extract_doc(&body).map(Some)
    }

    async fn find(&self, collection: &str, query: &Query) -> StoreResult<FindResult> {
        let mut request = self.request(Method::GET, self.url(collection, None), None);
        if let Some(filter) = &query.filter {
            request = request.query(&filter.query_pairs());
        }
        if let Some(limit) = query.limit {
            request = request.query(&[("limit", limit.to_string())]);
        }

        let (status, body) = self.send(request).await?;
        if !status.is_success() {
            return Err(error_from_body(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }
}
