//! Single-job status polling for webhook-backed forms.
//!
//! [`JobPollingController`](controller::JobPollingController) tracks one
//! job at a time: it checks the job's status immediately, then on a fixed
//! interval, until the job settles, the attempt budget runs out, or the
//! caller stops it. State is published through a `watch` channel as
//! [`PollerSnapshot`](snapshot::PollerSnapshot) values, and lifecycle
//! changes are broadcast as [`PollerEvent`](events::PollerEvent)s.

pub mod config;
pub mod controller;
pub mod events;
pub mod snapshot;
