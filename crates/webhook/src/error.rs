/// Errors from the webhook client layer.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The webhook returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    /// The submission response did not name a job.
    #[error("No job ID returned from server")]
    MissingJobId,

    /// Required configuration is missing or malformed.
    #[error("Invalid webhook configuration: {0}")]
    InvalidConfig(String),
}
