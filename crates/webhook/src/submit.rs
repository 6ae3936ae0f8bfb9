//! Form submission webhook client.
//!
//! Submissions are never retried: a failed submit is reported to the
//! caller, who decides whether to resubmit the form.

use formhook_core::types::JobId;
use serde::Serialize;

use crate::config::WebhookConfig;
use crate::error::WebhookError;
use crate::payload::extract_job_id;

/// Posts form payloads to a workflow webhook.
pub struct SubmitWebhook {
    client: reqwest::Client,
    submit_url: String,
}

impl SubmitWebhook {
    pub fn new(submit_url: impl Into<String>) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .timeout(crate::config::DEFAULT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, submit_url))
    }

    pub fn with_client(client: reqwest::Client, submit_url: impl Into<String>) -> Self {
        Self {
            client,
            submit_url: submit_url.into(),
        }
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self, WebhookError> {
        Ok(Self::with_client(
            config.build_client()?,
            config.submit_url.clone(),
        ))
    }

    /// Submit a form payload as JSON and return the job id from the
    /// response (`jobId`, falling back to `id`).
    pub async fn submit<T: Serialize + ?Sized>(&self, form: &T) -> Result<JobId, WebhookError> {
        let response = self.client.post(&self.submit_url).json(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                url = %self.submit_url,
                status = status.as_u16(),
                "Form submission rejected",
            );
            return Err(WebhookError::HttpStatus(status.as_u16()));
        }

        let body: serde_json::Value = response.json().await?;
        let job_id = extract_job_id(&body).ok_or(WebhookError::MissingJobId)?;

        tracing::info!(job_id = %job_id, "Form submitted, job started");
        Ok(job_id)
    }
}
