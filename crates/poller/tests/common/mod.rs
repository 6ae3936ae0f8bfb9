//! Shared test helpers: a status checker driven by per-job scripts.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use formhook_core::checker::StatusChecker;
use formhook_core::error::CheckError;
use formhook_core::job_status::{JobState, JobStatus};
use formhook_poller::config::PollerConfig;
use formhook_poller::controller::JobPollingController;
use tokio::time::Instant;

/// One scripted response, optionally delayed.
#[derive(Debug, Clone)]
pub struct Step {
    pub delay: Duration,
    pub response: Result<JobStatus, CheckError>,
    /// Never answer at all.
    pub hangs: bool,
}

impl Step {
    pub fn ok(status: JobStatus) -> Self {
        Self {
            delay: Duration::ZERO,
            response: Ok(status),
            hangs: false,
        }
    }

    pub fn err(error: CheckError) -> Self {
        Self {
            delay: Duration::ZERO,
            response: Err(error),
            hangs: false,
        }
    }

    /// A check whose request never completes.
    pub fn hang() -> Self {
        Self {
            hangs: true,
            ..Self::ok(pending())
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A check observed by the checker, timed from checker creation.
#[derive(Debug, Clone)]
pub struct Call {
    pub job_id: String,
    pub at: Duration,
}

/// Replays scripted steps per job id, then repeats `fallback` forever.
pub struct ScriptedChecker {
    origin: Instant,
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    fallback: Step,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedChecker {
    pub fn new(fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            origin: Instant::now(),
            scripts: Mutex::new(HashMap::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn always_pending() -> Arc<Self> {
        Self::new(Step::ok(pending()))
    }

    pub fn script(&self, job_id: &str, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .extend(steps);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, job_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.job_id == job_id)
            .count()
    }

    /// Offsets of every check, in whole seconds since creation.
    pub fn call_secs(&self) -> Vec<u64> {
        self.calls().iter().map(|c| c.at.as_secs()).collect()
    }
}

#[async_trait::async_trait]
impl StatusChecker for ScriptedChecker {
    async fn check(&self, job_id: &str) -> Result<JobStatus, CheckError> {
        let step = {
            self.calls.lock().unwrap().push(Call {
                job_id: job_id.to_string(),
                at: self.origin.elapsed(),
            });
            self.scripts
                .lock()
                .unwrap()
                .get_mut(job_id)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| self.fallback.clone())
        };

        if step.hangs {
            std::future::pending::<()>().await;
        }
        if !step.delay.is_zero() {
            tokio::time::sleep(step.delay).await;
        }
        step.response
    }
}

pub fn pending() -> JobStatus {
    JobStatus::with_state(JobState::Pending)
}

pub fn completed() -> JobStatus {
    JobStatus::with_state(JobState::Completed)
}

/// Controller with an interval in whole seconds.
pub fn controller(
    checker: &Arc<ScriptedChecker>,
    interval_secs: u64,
    max_attempts: u32,
) -> JobPollingController {
    let config = PollerConfig::new(Duration::from_secs(interval_secs), max_attempts).unwrap();
    JobPollingController::new(checker.clone(), config).unwrap()
}
