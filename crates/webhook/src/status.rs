//! Status-check webhook client.

use formhook_core::checker::StatusChecker;
use formhook_core::error::CheckError;
use formhook_core::job_status::JobStatus;
use reqwest::header::CONTENT_TYPE;

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::payload::decode_status;

/// Checks job status with `GET <status_url>?id=<job id>`.
pub struct StatusWebhook {
    client: reqwest::Client,
    status_url: String,
}

impl StatusWebhook {
    /// Create a client with its own connection pool and the default timeout.
    pub fn new(status_url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(crate::config::DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, status_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, status_url: impl Into<String>) -> Self {
        Self {
            client,
            status_url: status_url.into(),
        }
    }

    /// Create a client from loaded configuration.
    pub fn from_config(config: &WebhookConfig) -> Result<Self, WebhookError> {
        Ok(Self::with_client(
            config.build_client()?,
            config.status_url.clone(),
        ))
    }

    pub fn status_url(&self) -> &str {
        &self.status_url
    }
}

#[async_trait::async_trait]
impl StatusChecker for StatusWebhook {
    async fn check(&self, job_id: &str) -> Result<JobStatus, CheckError> {
        let response = self
            .client
            .get(&self.status_url)
            .query(&[("id", job_id)])
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| CheckError::Request(e.to_string()))?;

        let status = response.status();
        tracing::debug!(job_id, status = status.as_u16(), "Status response received");
        if !status.is_success() {
            return Err(CheckError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CheckError::Request(e.to_string()))?;
        decode_status(&body)
    }
}
