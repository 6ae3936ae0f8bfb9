//! The status-check capability consumed by the poller.
//!
//! Anything that can turn a job id into a [`JobStatus`] can drive a
//! polling session: an HTTP webhook, an in-process queue, or a closure
//! in tests. Use [`checker_fn`] to adapt an async closure.

use std::future::Future;

use crate::error::CheckError;
use crate::job_status::JobStatus;

/// Performs one read-only status lookup for a job.
#[async_trait::async_trait]
pub trait StatusChecker: Send + Sync + 'static {
    /// Fetch the current status of `job_id`.
    ///
    /// Implementations must tolerate payloads with any subset of
    /// [`JobStatus`] fields missing.
    async fn check(&self, job_id: &str) -> Result<JobStatus, CheckError>;
}

/// A [`StatusChecker`] backed by an async closure.
pub struct FnChecker<F> {
    f: F,
}

/// Wrap an async closure taking the job id as a [`StatusChecker`].
pub fn checker_fn<F, Fut>(f: F) -> FnChecker<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JobStatus, CheckError>> + Send + 'static,
{
    FnChecker { f }
}

#[async_trait::async_trait]
impl<F, Fut> StatusChecker for FnChecker<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JobStatus, CheckError>> + Send + 'static,
{
    async fn check(&self, job_id: &str) -> Result<JobStatus, CheckError> {
        (self.f)(job_id.to_string()).await
    }
}
