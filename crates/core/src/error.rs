use serde::Serialize;

/// A single status check failed before a usable payload was obtained.
///
/// Cloneable so the most recent failure can be carried inside published
/// poller snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum CheckError {
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("Status request failed: {0}")]
    Request(String),

    /// The status endpoint answered with a non-2xx code.
    #[error("Failed to check job status: {0}")]
    HttpStatus(u16),

    /// The response body was not a status payload.
    #[error("Invalid status payload: {0}")]
    Decode(String),
}

/// The error recorded as `last_error` on a polling session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum PollError {
    /// A check failed; the session kept polling.
    #[error("Failed to check job status: {0}")]
    Transport(CheckError),

    /// The attempt budget ran out without a terminal job status.
    #[error("Job status check timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },
}

impl PollError {
    /// True when this error ended the session.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}

impl From<CheckError> for PollError {
    fn from(err: CheckError) -> Self {
        Self::Transport(err)
    }
}
