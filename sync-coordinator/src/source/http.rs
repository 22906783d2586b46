//! HTTP source backed by the portal's REST API.
//!
//! `GET {base_url}/assignments` and `GET {base_url}/submissions`, each
//! returning a JSON array.

use super::{RemoteSource, SourceError};
use crate::config::RemoteConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use sync_types::{Assignment, Submission};

/// Remote source speaking to the portal API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSource {
    /// Build a source from the `[remote]` configuration.
    ///
    /// # Errors
    ///
    /// Returns `Unavailable` if the HTTP client cannot be constructed.
    pub fn new(config: &RemoteConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }

        response.json::<T>().await.map_err(map_reqwest_error)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_decode() {
        SourceError::Decode(e.to_string())
    } else {
        SourceError::Request(e.to_string())
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch_assignments(&self) -> Result<Vec<Assignment>, SourceError> {
        self.get_json("assignments").await
    }

    async fn fetch_submissions(&self) -> Result<Vec<Submission>, SourceError> {
        self.get_json("submissions").await
    }
}
