//! HTTP transport for the video events endpoint.

use crate::error::{describe, TriggerError};
use crate::models::AnalyticsRequest;
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Sends an [`AnalyticsRequest`] and yields the raw response body.
pub trait Transport: Send + Sync + 'static {
    fn post_form(
        &self,
        request: &AnalyticsRequest,
    ) -> impl Future<Output = std::result::Result<String, TriggerError>> + Send;
}

/// Transport backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    timeout_seconds: Option<u64>,
    http_client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport for a server base URL such as `http://localhost:8080`.
    ///
    /// Without `timeout_seconds` the client waits as long as the connection stays open.
    pub fn new(base_url: &str, timeout_seconds: Option<u64>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        info!("Using video events server at {}", base_url);

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_seconds,
            http_client,
        })
    }

    /// Full URL the request is posted to.
    pub fn endpoint(&self, request: &AnalyticsRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }
}

impl Transport for HttpTransport {
    async fn post_form(
        &self,
        request: &AnalyticsRequest,
    ) -> std::result::Result<String, TriggerError> {
        let url = self.endpoint(request);
        debug!("POST {} with body {}", url, request.body());

        let response = self
            .http_client
            .post(&url)
            .header(CONTENT_TYPE, request.content_type())
            .body(request.body())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    warn!(
                        "Request timed out after {}s",
                        self.timeout_seconds.unwrap_or_default()
                    );
                } else if e.is_connect() {
                    warn!("Cannot connect to video events server at {}", self.base_url);
                }
                TriggerError::Transport(e)
            })?;

        // Error statuses are relayed like any other body.
        let status = response.status();
        if !status.is_success() {
            warn!("Video events endpoint answered {}", status);
        }

        response
            .text()
            .await
            .map_err(|e| TriggerError::ResponseHandling(describe(e)))
    }
}
