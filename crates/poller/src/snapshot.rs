//! Observable state of a polling session.

use formhook_core::error::PollError;
use formhook_core::job_status::{message_of, progress_of, JobState, JobStatus};
use formhook_core::types::{JobId, Timestamp};
use serde::Serialize;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Never started, or stopped by the caller.
    Idle,
    /// The timer is armed or checks are still outstanding.
    Polling,
    /// The job reported `completed` or `failed`.
    Settled,
    /// The attempt budget ran out without a terminal job status.
    TimedOut,
}

/// How a finished session ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed { result: Option<serde_json::Value> },
    Failed { error: Option<String> },
    /// The poller gave up; the job may still be running remotely.
    TimedOut { attempts: u32 },
}

/// Point-in-time copy of a controller's session, published on every change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollerSnapshot {
    /// Session number; bumped by every accepted `start`.
    pub session: u64,
    pub job_id: Option<JobId>,
    pub phase: SessionPhase,
    /// Last applied status payload.
    pub status: Option<JobStatus>,
    /// Checks issued so far in this session.
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<PollError>,
    pub last_checked_at: Option<Timestamp>,
}

impl PollerSnapshot {
    /// State of a controller that has not been started.
    pub fn idle(max_attempts: u32) -> Self {
        Self {
            session: 0,
            job_id: None,
            phase: SessionPhase::Idle,
            status: None,
            attempts: 0,
            max_attempts,
            last_error: None,
            last_checked_at: None,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.phase == SessionPhase::Polling
    }

    pub fn is_timed_out(&self) -> bool {
        self.phase == SessionPhase::TimedOut
    }

    /// Progress percentage for display; see [`JobStatus::derived_progress`].
    pub fn progress(&self) -> f64 {
        progress_of(self.status.as_ref())
    }

    /// Status line for display; see [`JobStatus::derived_message`].
    pub fn message(&self, default: &str) -> String {
        message_of(self.status.as_ref(), default)
    }

    /// Final outcome, or `None` while polling or after a manual stop.
    pub fn outcome(&self) -> Option<SessionOutcome> {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Polling => None,
            SessionPhase::TimedOut => Some(SessionOutcome::TimedOut {
                attempts: self.attempts,
            }),
            SessionPhase::Settled => {
                let status = self.status.as_ref()?;
                match status.status? {
                    JobState::Completed => Some(SessionOutcome::Completed {
                        result: status.result.clone(),
                    }),
                    JobState::Failed => Some(SessionOutcome::Failed {
                        error: status.error.clone().or_else(|| status.message.clone()),
                    }),
                    _ => None,
                }
            }
        }
    }
}
