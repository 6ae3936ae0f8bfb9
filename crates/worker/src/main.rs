//! `formhook-worker` -- submit one form and follow its job to the end.
//!
//! Posts a JSON form payload to the submit webhook, then polls the status
//! webhook until the job settles or the attempt budget runs out. Progress
//! is logged as it arrives; the final result is printed to stdout as JSON.
//!
//! # Environment variables
//!
//! | Variable               | Required | Default | Description                              |
//! |------------------------|----------|---------|------------------------------------------|
//! | `SUBMIT_WEBHOOK_URL`   | yes      | --      | Endpoint accepting the form payload      |
//! | `STATUS_WEBHOOK_URL`   | yes      | --      | Endpoint answering `?id=<job id>`        |
//! | `FORM_PAYLOAD`         | yes      | --      | JSON object sent as the form submission  |
//! | `WEBHOOK_TIMEOUT_SECS` | no       | `30`    | Per-request HTTP timeout                 |
//! | `POLL_INTERVAL_MS`     | no       | `6000`  | Delay between status checks              |
//! | `POLL_MAX_ATTEMPTS`    | no       | `10`    | Status checks before giving up           |
//! | `PROCESSING_MESSAGE`   | no       | see below | Status line shown before the job reports one |

use std::sync::Arc;

use anyhow::{bail, Context};
use formhook_poller::config::PollerConfig;
use formhook_poller::controller::JobPollingController;
use formhook_poller::events::PollerEvent;
use formhook_poller::snapshot::SessionOutcome;
use formhook_webhook::config::WebhookConfig;
use formhook_webhook::status::StatusWebhook;
use formhook_webhook::submit::SubmitWebhook;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_PROCESSING_MESSAGE: &str =
    "We're generating your content. This usually takes 2-5 minutes.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formhook_worker=info,formhook_poller=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let webhooks = WebhookConfig::from_env()?;
    let poller_config = PollerConfig::from_env()?;
    let processing_message = std::env::var("PROCESSING_MESSAGE")
        .unwrap_or_else(|_| DEFAULT_PROCESSING_MESSAGE.to_string());

    let form: serde_json::Value = serde_json::from_str(
        &std::env::var("FORM_PAYLOAD").context("FORM_PAYLOAD environment variable is required")?,
    )
    .context("FORM_PAYLOAD must be valid JSON")?;

    tracing::info!(
        submit_url = %webhooks.submit_url,
        status_url = %webhooks.status_url,
        interval_ms = poller_config.interval.as_millis() as u64,
        max_attempts = poller_config.max_attempts,
        "Starting formhook-worker",
    );

    let client = webhooks.build_client()?;
    let submit = SubmitWebhook::with_client(client.clone(), webhooks.submit_url.clone());
    let status = Arc::new(StatusWebhook::with_client(client, webhooks.status_url.clone()));

    let job_id = submit
        .submit(&form)
        .await
        .context("Failed to submit request")?;

    let poller = JobPollingController::new(status, poller_config)?;
    let events = poller.events();
    tokio::spawn(log_progress(events, processing_message));

    poller.start(job_id.clone());

    let finished = tokio::select! {
        snapshot = poller.wait_until_finished() => snapshot,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(job_id = %job_id, "Interrupted, stopping polling");
            poller.stop();
            poller.snapshot()
        }
    };

    match finished.outcome() {
        Some(SessionOutcome::Completed { result }) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Some(SessionOutcome::Failed { error }) => bail!(
            "Job {job_id} failed: {}",
            error.unwrap_or_else(|| "no error reported".into())
        ),
        Some(SessionOutcome::TimedOut { attempts }) => bail!(
            "Gave up on job {job_id} after {attempts} status checks; it may still be running"
        ),
        None => bail!("Polling for job {job_id} was stopped before it finished"),
    }
}

/// Log every status update until the event channel closes.
async fn log_progress(mut events: broadcast::Receiver<PollerEvent>, default_message: String) {
    loop {
        match events.recv().await {
            Ok(PollerEvent::StatusUpdated {
                job_id,
                attempt,
                status,
                ..
            }) => {
                tracing::info!(
                    job_id = %job_id,
                    attempt,
                    progress = status.derived_progress(),
                    "{}",
                    status.derived_message(&default_message),
                );
            }
            Ok(PollerEvent::CheckFailed {
                job_id,
                attempt,
                error,
                ..
            }) => {
                tracing::warn!(job_id = %job_id, attempt, error = %error, "Status check failed");
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Progress logger lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
