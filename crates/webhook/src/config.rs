use std::time::Duration;

use crate::error::WebhookError;

/// Default per-request timeout for webhook calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Webhook endpoints for one form.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Endpoint that accepts the form payload and returns a job id.
    pub submit_url: String,
    /// Endpoint that reports job status for `?id=<job id>`.
    pub status_url: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
}

impl WebhookConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Required | Default |
    /// |------------------------|----------|---------|
    /// | `SUBMIT_WEBHOOK_URL`   | yes      | --      |
    /// | `STATUS_WEBHOOK_URL`   | yes      | --      |
    /// | `WEBHOOK_TIMEOUT_SECS` | no       | `30`    |
    pub fn from_env() -> Result<Self, WebhookError> {
        let submit_url = required_var("SUBMIT_WEBHOOK_URL")?;
        let status_url = required_var("STATUS_WEBHOOK_URL")?;

        let timeout = match std::env::var("WEBHOOK_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    WebhookError::InvalidConfig(format!(
                        "WEBHOOK_TIMEOUT_SECS must be a whole number of seconds, got {raw:?}"
                    ))
                })?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            submit_url,
            status_url,
            timeout,
        })
    }

    /// Build an HTTP client honouring the configured timeout. Share it
    /// between the submit and status clients to pool connections.
    pub fn build_client(&self) -> Result<reqwest::Client, WebhookError> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

fn required_var(name: &str) -> Result<String, WebhookError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(WebhookError::InvalidConfig(format!(
            "{name} environment variable is required"
        ))),
    }
}
