//! The job polling controller.
//!
//! A [`JobPollingController`] owns at most one polling loop. Calling
//! [`start`](JobPollingController::start) retires whatever loop was
//! running, opens a new session, issues the first status check right
//! away, and arms a timer for the rest. Each check runs as its own task
//! so a slow endpoint never holds up the timer; responses are applied
//! only if they still belong to the live, polling session.
//!
//! All state transitions happen under one lock and are published as a
//! [`PollerSnapshot`] on a `watch` channel, with a matching
//! [`PollerEvent`] on a broadcast channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use formhook_core::checker::StatusChecker;
use formhook_core::error::{CheckError, PollError};
use formhook_core::job_status::JobStatus;
use formhook_core::types::{JobId, Timestamp};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, PollerConfig};
use crate::events::PollerEvent;
use crate::snapshot::{PollerSnapshot, SessionPhase};

/// Broadcast channel capacity for poller events.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Tracks one job's status until it settles, times out, or is stopped.
///
/// Must be used from within a Tokio runtime. Dropping the controller
/// stops its session.
pub struct JobPollingController {
    shared: Arc<Shared>,
}

/// State shared between the controller, its timer task, and its check tasks.
struct Shared {
    checker: Arc<dyn StatusChecker>,
    config: PollerConfig,
    session: Mutex<Session>,
    state_tx: watch::Sender<PollerSnapshot>,
    event_tx: broadcast::Sender<PollerEvent>,
}

/// Mutable session bookkeeping. Only touched under [`Shared::session`].
struct Session {
    id: u64,
    job_id: Option<JobId>,
    phase: SessionPhase,
    status: Option<JobStatus>,
    attempts: u32,
    /// Checks issued in this session whose responses have not been applied.
    in_flight: u32,
    last_error: Option<PollError>,
    last_checked_at: Option<Timestamp>,
    timer: Option<TimerHandle>,
}

/// The one live timer loop.
struct TimerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stop the loop: no tick fires after this returns.
    fn retire(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

impl JobPollingController {
    /// Create an idle controller.
    pub fn new(
        checker: Arc<dyn StatusChecker>,
        config: PollerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (state_tx, _) = watch::channel(PollerSnapshot::idle(config.max_attempts));
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let session = Session {
            id: 0,
            job_id: None,
            phase: SessionPhase::Idle,
            status: None,
            attempts: 0,
            in_flight: 0,
            last_error: None,
            last_checked_at: None,
            timer: None,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                checker,
                config,
                session: Mutex::new(session),
                state_tx,
                event_tx,
            }),
        })
    }

    /// Start polling `job_id`, replacing any previous session.
    ///
    /// An empty or blank id is ignored. Otherwise the previous timer is
    /// retired, counters and errors are reset, the first check is issued
    /// immediately, and the next one follows after one interval. The
    /// session times out once every budgeted check has answered, or one
    /// interval after the last check was issued, whichever comes first.
    pub fn start(&self, job_id: impl Into<JobId>) {
        let job_id = job_id.into();
        if job_id.trim().is_empty() {
            tracing::warn!("Ignoring start request without a job id");
            return;
        }

        let shared = &self.shared;
        let mut session = shared.lock();

        if let Some(timer) = session.timer.take() {
            timer.retire();
        }

        session.id += 1;
        session.job_id = Some(job_id.clone());
        session.phase = SessionPhase::Polling;
        session.status = None;
        session.attempts = 0;
        session.in_flight = 0;
        session.last_error = None;
        session.last_checked_at = None;

        let session_id = session.id;
        tracing::info!(
            job_id = %job_id,
            session = session_id,
            interval_ms = shared.config.interval.as_millis() as u64,
            max_attempts = shared.config.max_attempts,
            "Starting job status polling",
        );

        shared.issue_check(&mut session, &job_id);

        let cancel = CancellationToken::new();
        let first_tick = Instant::now() + shared.config.interval;
        let task = tokio::spawn(run_timer(
            Arc::clone(shared),
            session_id,
            job_id.clone(),
            first_tick,
            cancel.clone(),
        ));
        session.timer = Some(TimerHandle { cancel, task });

        shared.publish(&session);
        let _ = shared.event_tx.send(PollerEvent::Started {
            session: session_id,
            job_id,
        });
    }

    /// Stop the current session.
    ///
    /// No further checks are issued, and responses to checks already in
    /// flight are discarded. Does nothing unless a session is polling.
    pub fn stop(&self) {
        let shared = &self.shared;
        let mut session = shared.lock();
        if session.phase != SessionPhase::Polling {
            return;
        }

        if let Some(timer) = session.timer.take() {
            timer.retire();
        }
        session.phase = SessionPhase::Idle;

        let job_id = session.job_id.clone().unwrap_or_default();
        tracing::info!(
            job_id = %job_id,
            session = session.id,
            attempts = session.attempts,
            "Stopped job status polling",
        );

        shared.publish(&session);
        let _ = shared.event_tx.send(PollerEvent::Stopped {
            session: session.id,
            job_id,
        });
    }

    /// Current published state.
    pub fn snapshot(&self) -> PollerSnapshot {
        self.shared.state_tx.borrow().clone()
    }

    /// Receive every published state change.
    pub fn subscribe(&self) -> watch::Receiver<PollerSnapshot> {
        self.shared.state_tx.subscribe()
    }

    /// Receive lifecycle events from now on.
    pub fn events(&self) -> broadcast::Receiver<PollerEvent> {
        self.shared.event_tx.subscribe()
    }

    /// Wait until the current session is no longer polling and return
    /// its final state. Returns immediately when idle.
    pub async fn wait_until_finished(&self) -> PollerSnapshot {
        let mut rx = self.subscribe();
        let finished = match rx.wait_for(|snapshot| !snapshot.is_polling()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        finished
    }

    pub fn is_polling(&self) -> bool {
        self.shared.state_tx.borrow().is_polling()
    }

    pub fn attempts(&self) -> u32 {
        self.shared.state_tx.borrow().attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.shared.config.max_attempts
    }

    pub fn last_error(&self) -> Option<PollError> {
        self.shared.state_tx.borrow().last_error.clone()
    }

    pub fn job_status(&self) -> Option<JobStatus> {
        self.shared.state_tx.borrow().status.clone()
    }

    pub fn config(&self) -> &PollerConfig {
        &self.shared.config
    }
}

impl Drop for JobPollingController {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, session: &Session) {
        self.state_tx.send_replace(PollerSnapshot {
            session: session.id,
            job_id: session.job_id.clone(),
            phase: session.phase,
            status: session.status.clone(),
            attempts: session.attempts,
            max_attempts: self.config.max_attempts,
            last_error: session.last_error.clone(),
            last_checked_at: session.last_checked_at,
        });
    }

    /// Count an attempt and spawn its check, tagged with the session id.
    fn issue_check(self: &Arc<Self>, session: &mut Session, job_id: &str) {
        session.attempts += 1;
        session.in_flight += 1;

        let attempt = session.attempts;
        tracing::debug!(
            job_id,
            session = session.id,
            attempt,
            max_attempts = self.config.max_attempts,
            "Checking job status",
        );

        tokio::spawn(run_check(
            Arc::clone(self),
            session.id,
            job_id.to_string(),
            attempt,
        ));
    }

    /// Handle a timer tick. Returns `false` once the timer has nothing
    /// left to do.
    ///
    /// The tick after the final check is the deadline: checks still in
    /// flight at that point are abandoned and the session times out.
    fn on_tick(self: &Arc<Self>, session_id: u64, job_id: &str) -> bool {
        let mut session = self.lock();
        if session.id != session_id || session.phase != SessionPhase::Polling {
            return false;
        }

        if session.attempts >= self.config.max_attempts {
            // Called from the timer task itself, so cancel without aborting.
            if let Some(timer) = session.timer.take() {
                timer.cancel.cancel();
            }
            if session.in_flight > 0 {
                tracing::warn!(
                    job_id,
                    session = session_id,
                    in_flight = session.in_flight,
                    "Abandoning unanswered status checks",
                );
            }
            self.time_out(&mut session, job_id);
            return false;
        }

        self.issue_check(&mut session, job_id);
        self.publish(&session);
        true
    }

    /// Move the live session to `TimedOut`. The caller owns the timer.
    fn time_out(&self, session: &mut Session, job_id: &str) {
        session.phase = SessionPhase::TimedOut;
        session.last_error = Some(PollError::TimedOut {
            attempts: session.attempts,
        });

        tracing::warn!(
            job_id,
            session = session.id,
            attempts = session.attempts,
            "Max attempts reached, stopping polling",
        );

        self.publish(session);
        let _ = self.event_tx.send(PollerEvent::TimedOut {
            session: session.id,
            job_id: job_id.to_string(),
            attempts: session.attempts,
        });
    }

    /// Apply a check response if it still belongs to the live session.
    fn apply(
        &self,
        session_id: u64,
        job_id: &str,
        attempt: u32,
        result: Result<JobStatus, CheckError>,
    ) {
        let mut session = self.lock();
        if session.id != session_id || session.phase != SessionPhase::Polling {
            tracing::debug!(
                job_id,
                session = session_id,
                attempt,
                "Discarding stale status response",
            );
            return;
        }

        session.in_flight = session.in_flight.saturating_sub(1);
        session.last_checked_at = Some(chrono::Utc::now());

        match result {
            Ok(status) if status.is_terminal() => {
                if let Some(timer) = session.timer.take() {
                    timer.retire();
                }
                session.phase = SessionPhase::Settled;
                session.status = Some(status.clone());

                tracing::info!(
                    job_id,
                    session = session_id,
                    attempt,
                    state = ?status.status,
                    "Job finished, stopping polling",
                );

                self.publish(&session);
                let _ = self.event_tx.send(PollerEvent::Settled {
                    session: session_id,
                    job_id: job_id.to_string(),
                    status,
                });
                return;
            }
            Ok(status) => {
                session.status = Some(status.clone());
                let _ = self.event_tx.send(PollerEvent::StatusUpdated {
                    session: session_id,
                    job_id: job_id.to_string(),
                    attempt,
                    status,
                });
            }
            Err(e) => {
                tracing::warn!(
                    job_id,
                    session = session_id,
                    attempt,
                    error = %e,
                    "Job status check failed",
                );
                session.last_error = Some(PollError::Transport(e.clone()));
                let _ = self.event_tx.send(PollerEvent::CheckFailed {
                    session: session_id,
                    job_id: job_id.to_string(),
                    attempt,
                    error: e,
                });
            }
        }

        if session.attempts >= self.config.max_attempts && session.in_flight == 0 {
            if let Some(timer) = session.timer.take() {
                timer.retire();
            }
            self.time_out(&mut session, job_id);
            return;
        }

        self.publish(&session);
    }
}

/// Timer loop: one tick per interval from `first_tick` on.
async fn run_timer(
    shared: Arc<Shared>,
    session_id: u64,
    job_id: JobId,
    first_tick: Instant,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(first_tick, shared.config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                if !shared.on_tick(session_id, &job_id) {
                    break;
                }
            }
        }
    }

    tracing::debug!(job_id = %job_id, session = session_id, "Polling timer exited");
}

/// One status check. The response is applied after the request returns,
/// against whatever session is live at that moment.
async fn run_check(shared: Arc<Shared>, session_id: u64, job_id: JobId, attempt: u32) {
    let pending = PendingCheck {
        shared,
        session_id,
        job_id,
        attempt,
        answered: false,
    };
    let result = pending.shared.checker.check(&pending.job_id).await;
    pending.answer(result);
}

/// An issued check that still owes its session a response.
///
/// If the check task ends without answering (the checker panicked, or the
/// runtime dropped the task) the attempt is applied as a failed check, so
/// `in_flight` always comes back down.
struct PendingCheck {
    shared: Arc<Shared>,
    session_id: u64,
    job_id: JobId,
    attempt: u32,
    answered: bool,
}

impl PendingCheck {
    fn answer(mut self, result: Result<JobStatus, CheckError>) {
        self.answered = true;
        self.shared
            .apply(self.session_id, &self.job_id, self.attempt, result);
    }
}

impl Drop for PendingCheck {
    fn drop(&mut self) {
        if self.answered {
            return;
        }
        self.shared.apply(
            self.session_id,
            &self.job_id,
            self.attempt,
            Err(CheckError::Request(
                "status check ended without a response".to_string(),
            )),
        );
    }
}
