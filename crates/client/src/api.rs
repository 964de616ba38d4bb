//! Thin REST client over the backend's envelope contract.
//!
//! Every endpoint wraps its payload in `{success, message, data, pagination?}`;
//! this layer owns URL construction, bearer-token attachment, status checks,
//! and envelope unwrapping. The access token is read from durable storage on
//! every request, so a login or logout in the same process takes effect
//! immediately.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;
use url::Url;

use mercadito_core::{Envelope, Pagination};

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::storage::{Storage, keys};

/// Client for the Mercadito REST backend.
///
/// Cheaply cloneable; clones share one connection pool and storage handle.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn Storage>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig, storage: Arc<dyn Storage>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        // `Url::join` treats the last segment of a slash-less base as a file
        // and would replace it, so normalize the base to end in a slash.
        let mut base_url = config.api_base_url.clone();
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url,
                storage,
            }),
        })
    }

    /// Resolve `path` against the base URL, appending query parameters.
    ///
    /// Callers pass parameters already sorted so that equivalent requests
    /// produce identical URLs (and identical cache keys).
    fn build_url(&self, path: &str, params: &[(String, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Decode(format!("invalid request path {path}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// Attach the bearer token when a session exists.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.inner.storage.get(keys::ACCESS_TOKEN).map(SecretString::from) {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and decode the response envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics.
        let body = response.text().await?;

        if !status.is_success() {
            let message = extract_message(&body)
                .unwrap_or_else(|| body.chars().take(200).collect::<String>());
            if status == StatusCode::NOT_FOUND {
                return Err(ApiError::NotFound(message));
            }
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str::<Envelope<T>>(&body).map_err(|e| {
            error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse response envelope"
            );
            ApiError::Decode(e.to_string())
        })
    }

    /// GET `path` and unwrap the envelope payload.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, rejection, and decode errors.
    pub async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ApiError> {
        let url = self.build_url(path, params)?;
        let envelope = self.send(self.inner.http.get(url)).await?;
        Ok(envelope.into_data()?)
    }

    /// GET `path` and unwrap the payload together with pagination metadata.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, rejection, and decode errors.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<(T, Pagination), ApiError> {
        let url = self.build_url(path, params)?;
        let envelope = self.send(self.inner.http.get(url)).await?;
        Ok(envelope.into_page()?)
    }

    /// POST `body` to `path` and unwrap the envelope payload.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, rejection, and decode errors.
    pub async fn post_data<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::POST, path, body).await
    }

    /// PUT `body` to `path` and unwrap the envelope payload.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, rejection, and decode errors.
    pub async fn put_data<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::PUT, path, body).await
    }

    /// PATCH `body` to `path` and unwrap the envelope payload.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, rejection, and decode errors.
    pub async fn patch_data<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(Method::PATCH, path, body).await
    }

    /// DELETE `path` with an optional JSON body and unwrap the envelope
    /// payload.
    ///
    /// # Errors
    ///
    /// Propagates transport, status, rejection, and decode errors.
    pub async fn delete_data<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path, &[])?;
        let mut request = self.inner.http.delete(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let envelope = self.send(request).await?;
        Ok(envelope.into_data()?)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.build_url(path, &[])?;
        let request = self.inner.http.request(method, url).json(body);
        let envelope = self.send(request).await?;
        Ok(envelope.into_data()?)
    }
}

/// Pull the backend's human-readable message out of an error body, if the
/// body still follows the envelope shape.
fn extract_message(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.message)
}
