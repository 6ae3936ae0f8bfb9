//! Lifecycle events emitted by a polling controller.
//!
//! These complement the `watch`-based snapshot: a snapshot only shows the
//! latest state, while events let a subscriber see every transition
//! (each applied payload, each failed check).

use formhook_core::error::CheckError;
use formhook_core::job_status::JobStatus;
use formhook_core::types::JobId;
use serde::Serialize;

/// A state change in a polling session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PollerEvent {
    /// A session began; the first check has been issued.
    Started { session: u64, job_id: JobId },

    /// A non-terminal payload was applied.
    StatusUpdated {
        session: u64,
        job_id: JobId,
        attempt: u32,
        status: JobStatus,
    },

    /// A check failed; polling continues.
    CheckFailed {
        session: u64,
        job_id: JobId,
        attempt: u32,
        error: CheckError,
    },

    /// The job reported `completed` or `failed`.
    Settled {
        session: u64,
        job_id: JobId,
        status: JobStatus,
    },

    /// The attempt budget ran out.
    TimedOut {
        session: u64,
        job_id: JobId,
        attempts: u32,
    },

    /// The caller stopped the session.
    Stopped { session: u64, job_id: JobId },
}

impl PollerEvent {
    /// Session the event belongs to.
    pub fn session(&self) -> u64 {
        match self {
            Self::Started { session, .. }
            | Self::StatusUpdated { session, .. }
            | Self::CheckFailed { session, .. }
            | Self::Settled { session, .. }
            | Self::TimedOut { session, .. }
            | Self::Stopped { session, .. } => *session,
        }
    }
}
