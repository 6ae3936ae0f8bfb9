//! Job status payloads returned by status webhooks.
//!
//! Status endpoints are not uniform: any field may be missing, progress
//! may or may not be reported, and the result shape belongs to whoever
//! produced the job. [`JobStatus`] therefore models every field as
//! optional, and the helpers in this module derive what a progress view
//! needs when the payload leaves it out.

use serde::{Deserialize, Serialize};

/// Progress shown before any status payload has arrived, or when the
/// payload carries an unrecognised state.
pub const DEFAULT_PROGRESS: f64 = 10.0;

pub const MSG_PENDING: &str = "Your request is queued and will start processing shortly...";
pub const MSG_PROCESSING: &str = "Processing your request... Almost done!";
pub const MSG_COMPLETED: &str = "Your content has been generated successfully!";
pub const MSG_FAILED: &str = "An error occurred while processing your request.";

/// Lifecycle state reported by a status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any state string this crate does not recognise.
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Completed and failed jobs will not change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Fallback progress percentage when the payload has none.
    pub fn fallback_progress(self) -> f64 {
        match self {
            Self::Pending => 25.0,
            Self::Processing => 50.0,
            Self::Completed => 100.0,
            Self::Failed => 0.0,
            Self::Unknown => DEFAULT_PROGRESS,
        }
    }
}

/// One status payload. Replaced wholesale on every successful check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Echo of the job id, when the endpoint includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<JobState>,
    /// Completion percentage (0-100), authoritative when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Opaque job output. Parsing it is the presentation layer's job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobStatus {
    /// A payload carrying only a state.
    pub fn with_state(state: JobState) -> Self {
        Self {
            status: Some(state),
            ..Default::default()
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// True when the payload reports `completed` or `failed`.
    pub fn is_terminal(&self) -> bool {
        self.status.is_some_and(JobState::is_terminal)
    }

    /// Progress percentage for display.
    ///
    /// A reported `progress` wins and is clamped to `[0, 100]`; a
    /// non-finite value is ignored. Otherwise the state's fallback is used.
    pub fn derived_progress(&self) -> f64 {
        match self.progress {
            Some(p) if p.is_finite() => p.clamp(0.0, 100.0),
            _ => self
                .status
                .map(JobState::fallback_progress)
                .unwrap_or(DEFAULT_PROGRESS),
        }
    }

    /// Human-readable status line for display.
    ///
    /// `default` is used when neither a message nor a recognised state
    /// is available.
    pub fn derived_message(&self, default: &str) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }

        match self.status {
            Some(JobState::Pending) => MSG_PENDING.to_string(),
            Some(JobState::Processing) => MSG_PROCESSING.to_string(),
            Some(JobState::Completed) => MSG_COMPLETED.to_string(),
            Some(JobState::Failed) => self
                .error
                .clone()
                .unwrap_or_else(|| MSG_FAILED.to_string()),
            Some(JobState::Unknown) | None => default.to_string(),
        }
    }
}

/// Progress for an optional payload; no payload yet means [`DEFAULT_PROGRESS`].
pub fn progress_of(status: Option<&JobStatus>) -> f64 {
    status.map_or(DEFAULT_PROGRESS, JobStatus::derived_progress)
}

/// Message for an optional payload; no payload yet means `default`.
pub fn message_of(status: Option<&JobStatus>, default: &str) -> String {
    status.map_or_else(|| default.to_string(), |s| s.derived_message(default))
}
