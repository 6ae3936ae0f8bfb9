//! HTTP webhook clients for job submission and status checks.
//!
//! [`SubmitWebhook`](submit::SubmitWebhook) posts a form payload and
//! returns the job id the remote workflow hands back.
//! [`StatusWebhook`](status::StatusWebhook) implements
//! [`StatusChecker`](formhook_core::checker::StatusChecker) by issuing
//! `GET <url>?id=<job id>` against the status endpoint.

pub mod config;
pub mod error;
pub mod payload;
pub mod status;
pub mod submit;
