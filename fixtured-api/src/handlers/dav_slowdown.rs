//! Artificial delay of WebDAV requests, read by the host per method

use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::parse_count;
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::{Path, State};
use serde_json::json;

const TESTING_APP: &str = "testing";

const DAV_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "DELETE", "OPTIONS", "PATCH", "PROPFIND", "PROPPATCH",
    "MKCOL", "COPY", "MOVE", "LOCK", "UNLOCK", "REPORT", "SEARCH", "MKCALENDAR",
];

pub async fn set_slowdown(
    State(state): State<AppState>,
    Path((method, seconds)): Path<(String, String)>,
) -> ApiResult<Envelope> {
    let method = method.trim().to_ascii_uppercase();
    if !DAV_METHODS.contains(&method.as_str()) {
        return Err(ApiError::InvalidInput(format!("unknown method: {method}")));
    }
    let seconds = parse_count(&seconds, "seconds")?;

    let key = format!("dav.slowdown.{method}");
    state
        .config_store
        .set_app_value(TESTING_APP, &key, &seconds.to_string())?;
    Ok(Envelope::ok(json!({ "method": method, "seconds": seconds })))
}
