//! Webhook clients against an in-process axum server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use formhook_core::checker::StatusChecker;
use formhook_core::error::CheckError;
use formhook_core::job_status::JobState;
use formhook_poller::config::PollerConfig;
use formhook_poller::controller::JobPollingController;
use formhook_poller::snapshot::{SessionOutcome, SessionPhase};
use formhook_webhook::error::WebhookError;
use formhook_webhook::status::StatusWebhook;
use formhook_webhook::submit::SubmitWebhook;
use serde_json::{json, Value};

/// Bind a router to an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

async fn status_handler(Query(params): Query<HashMap<String, String>>) -> axum::response::Response {
    match params.get("id").map(String::as_str) {
        Some("done") => Json(json!({
            "id": "done",
            "status": "completed",
            "result": "[{\"title\":\"Topic\"}]",
        }))
        .into_response(),
        Some("wrapped") => Json(json!([{ "status": "processing", "progress": 60 }])).into_response(),
        Some("broken") => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        Some("html") => "<html>not json</html>".into_response(),
        Some(_) => Json(json!({ "status": "pending" })).into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

async fn submit_handler(Json(form): Json<Value>) -> Json<Value> {
    if form.get("webinarTopic").is_some() {
        Json(json!({ "jobId": "job-123" }))
    } else {
        Json(json!({ "id": 42 }))
    }
}

fn status_router() -> Router {
    Router::new().route("/status", get(status_handler))
}

// ---------------------------------------------------------------------------
// StatusWebhook
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_sends_job_id_as_query_parameter() {
    let base = serve(status_router()).await;
    let webhook = StatusWebhook::new(format!("{base}/status")).unwrap();

    let status = webhook.check("done").await.unwrap();
    assert_eq!(status.status, Some(JobState::Completed));
    assert_eq!(status.id.as_deref(), Some("done"));
    assert!(status.result.is_some());

    let status = webhook.check("anything-else").await.unwrap();
    assert_eq!(status.status, Some(JobState::Pending));
}

#[tokio::test]
async fn status_accepts_wrapped_payload() {
    let base = serve(status_router()).await;
    let webhook = StatusWebhook::new(format!("{base}/status")).unwrap();

    let status = webhook.check("wrapped").await.unwrap();
    assert_eq!(status.status, Some(JobState::Processing));
    assert_eq!(status.derived_progress(), 60.0);
}

#[tokio::test]
async fn status_maps_http_errors() {
    let base = serve(status_router()).await;
    let webhook = StatusWebhook::new(format!("{base}/status")).unwrap();

    assert_matches!(webhook.check("broken").await, Err(CheckError::HttpStatus(500)));

    let missing = StatusWebhook::new(format!("{base}/nope")).unwrap();
    assert_matches!(missing.check("x").await, Err(CheckError::HttpStatus(404)));
}

#[tokio::test]
async fn status_maps_bad_body_to_decode_error() {
    let base = serve(status_router()).await;
    let webhook = StatusWebhook::new(format!("{base}/status")).unwrap();

    assert_matches!(webhook.check("html").await, Err(CheckError::Decode(_)));
}

#[tokio::test]
async fn status_maps_unreachable_host_to_request_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let webhook = StatusWebhook::new(format!("http://{addr}/status")).unwrap();
    assert_matches!(webhook.check("x").await, Err(CheckError::Request(_)));
}

// ---------------------------------------------------------------------------
// SubmitWebhook
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_returns_job_id() {
    let base = serve(Router::new().route("/submit", post(submit_handler))).await;
    let webhook = SubmitWebhook::new(format!("{base}/submit")).unwrap();

    let job_id = webhook
        .submit(&json!({ "webinarTopic": "10 Minute Workouts", "targetBuyer": "Working Mums" }))
        .await
        .unwrap();
    assert_eq!(job_id, "job-123");

    let job_id = webhook.submit(&json!({ "other": true })).await.unwrap();
    assert_eq!(job_id, "42");
}

#[tokio::test]
async fn submit_without_job_id_fails() {
    let router = Router::new().route("/submit", post(|| async { Json(json!({ "ok": true })) }));
    let base = serve(router).await;
    let webhook = SubmitWebhook::new(format!("{base}/submit")).unwrap();

    assert_matches!(
        webhook.submit(&json!({})).await,
        Err(WebhookError::MissingJobId)
    );
}

#[tokio::test]
async fn submit_rejected_status_is_reported() {
    let router = Router::new().route("/submit", post(|| async { StatusCode::BAD_GATEWAY }));
    let base = serve(router).await;
    let webhook = SubmitWebhook::new(format!("{base}/submit")).unwrap();

    assert_matches!(
        webhook.submit(&json!({})).await,
        Err(WebhookError::HttpStatus(502))
    );
}

// ---------------------------------------------------------------------------
// End to end: controller polling a live status endpoint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn controller_polls_webhook_until_completed() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/status",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                match hits.fetch_add(1, Ordering::SeqCst) {
                    0 => Json(json!({ "status": "processing", "progress": 40 })),
                    1 => Json(json!({ "status": "processing", "message": "Writing outlines" })),
                    _ => Json(json!({ "status": "completed", "result": [{ "title": "A" }] })),
                }
            }),
        )
        .with_state(Arc::clone(&hits));
    let base = serve(router).await;

    let checker = Arc::new(StatusWebhook::new(format!("{base}/status")).unwrap());
    let config = PollerConfig::new(Duration::from_millis(200), 20).unwrap();
    let poller = JobPollingController::new(checker, config).unwrap();

    poller.start("job-123");
    let finished = tokio::time::timeout(Duration::from_secs(10), poller.wait_until_finished())
        .await
        .expect("polling should finish");

    assert_eq!(finished.phase, SessionPhase::Settled);
    assert_eq!(finished.attempts, 3);
    assert_eq!(
        finished.outcome(),
        Some(SessionOutcome::Completed {
            result: Some(json!([{ "title": "A" }]))
        })
    );
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}
