//! Normalisation of webhook response bodies.
//!
//! Workflow engines commonly wrap a single response object in a
//! one-element array. Both shapes are accepted.

use formhook_core::error::CheckError;
use formhook_core::job_status::JobStatus;
use serde_json::Value;

/// Unwrap `[obj]` to `obj`; other values pass through.
pub fn unwrap_single(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}

/// Decode a status response body.
pub fn decode_status(body: &[u8]) -> Result<JobStatus, CheckError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| CheckError::Decode(e.to_string()))?;
    serde_json::from_value(unwrap_single(value)).map_err(|e| CheckError::Decode(e.to_string()))
}

/// Pull the job id out of a submission response: `jobId` first, then
/// `id`. String and numeric ids are accepted; blank strings are not.
pub fn extract_job_id(body: &Value) -> Option<String> {
    let body = match body {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    };

    ["jobId", "id"].iter().find_map(|key| match body.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
