//! HTTP client for the Stash file catalog API.
//!
//! Provides a minimal client with generic GET/POST/DELETE helpers that map every
//! failure onto [`TransportError`], and domain methods (upload, list, delete, stats,
//! type facets, reference graph, download). The [`FileCatalog`] trait is the seam the
//! sync layer depends on; [`ApiClient`] is its HTTP implementation.

pub mod api;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use stash_core::{ClientConfig, ClientError, TransportError};

pub use api::FileCatalog;

/// HTTP client for the catalog API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.api_url.clone(), config.request_timeout)
    }

    /// Create client from environment (see [`ClientConfig::from_env`]).
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_config(&ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request with optional query parameters. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let mut request = self.client.get(&url);

        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(request_error)?;
        decode(ensure_success(response).await?).await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, TransportError> {
        let url = self.build_url(path);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(request_error)?;

        decode(ensure_success(response).await?).await
    }

    /// DELETE request. Returns Ok(()) on success.
    pub async fn delete(&self, path: &str) -> Result<(), TransportError> {
        let url = self.build_url(path);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(request_error)?;

        ensure_success(response).await?;
        Ok(())
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn request_error(err: reqwest::Error) -> TransportError {
    TransportError::Request(err.to_string())
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(TransportError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let bytes = response.bytes().await.map_err(request_error)?;
    Ok(serde_json::from_slice(&bytes)?)
}

// Re-export domain types for convenience.
pub use stash_core::models::{
    FileCandidate, FileRecord, FileReference, FileReferences, StorageStats, UploadResponse,
};
