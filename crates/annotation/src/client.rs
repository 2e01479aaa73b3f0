use anyhow::{Context, Result};
use std::time::Duration;
use thiserror::Error;

use crate::request::{build_hazard_request, FeatureSet};
use crate::schema::AnnotationResult;

pub const DEFAULT_VERSION: &str = "2019-07-12";

#[derive(Error, Debug)]
pub enum NluError {
    #[error("Failed to send request to NLU service: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("NLU request failed: {status} {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse NLU response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl NluError {
    /// Connection failures, throttling and 5xx may clear up on their own.
    /// Other 4xx (bad key, bad request) and unparseable bodies will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            NluError::Transport(_) => true,
            NluError::Status { status, .. } => *status == 429 || *status >= 500,
            NluError::Decode(_) => false,
        }
    }
}

#[derive(Clone)]
pub struct NluClient {
    base_url: String,
    api_key: String,
    version: String,
    features: FeatureSet,
    client: reqwest::Client,
}

impl NluClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            version: DEFAULT_VERSION.to_string(),
            features: FeatureSet::default(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build NLU HTTP client")?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Annotate `text` with entities, keywords, target emotion and relations.
    pub async fn analyze(&self, text: &str) -> Result<AnnotationResult, NluError> {
        let url = format!("{}/v1/analyze", self.base_url);
        let request = build_hazard_request(text, &self.features);

        tracing::debug!(url = %url, chars = text.len(), "Sending analyze request");

        let response = self.client
            .post(&url)
            .query(&[("version", self.version.as_str())])
            .basic_auth("apikey", Some(&self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(NluError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NluError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(NluError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> NluError {
        NluError::Status {
            status: code,
            body: String::new(),
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = NluClient::new("https://nlu.example.com/".to_string(), "key".to_string());
        assert_eq!(client.base_url(), "https://nlu.example.com");
    }

    #[test]
    fn test_client_errors_are_not_retryable() {
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(status(429).is_retryable());
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
    }

    #[test]
    fn test_status_error_message() {
        let err = NluError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "NLU request failed: 401 unauthorized");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_retryable_error() {
        let client = NluClient::new("http://127.0.0.1:9".to_string(), "key".to_string())
            .with_timeout(Duration::from_millis(500))
            .unwrap();

        let err = client.analyze("fire").await.unwrap_err();
        assert!(matches!(err, NluError::Transport(_)));
        assert!(err.is_retryable());
    }
}
