//! Shared domain types for webhook-backed form jobs.
//!
//! Holds the status payload model returned by job status endpoints, the
//! pure progress/message derivation used by presentation layers, the
//! [`StatusChecker`](checker::StatusChecker) capability consumed by the
//! poller, and the error types that surface in published poller state.

pub mod checker;
pub mod error;
pub mod job_status;
pub mod types;
