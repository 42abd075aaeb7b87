//! Notification injection
//!
//! Open to every authenticated user, not only administrators.

use crate::auth::Principal;
use crate::error::ApiResult;
use crate::params::Params;
use crate::response::Envelope;
use crate::state::AppState;
use axum::Extension;
use axum::extract::State;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tracing::debug;

/// `app` and `user` select the target, every other field becomes payload.
/// Without `user` the notification goes to the caller.
pub async fn add(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Params(mut fields): Params<Map<String, Value>>,
) -> ApiResult<Envelope> {
    let app = take_text(&mut fields, "app")
        .unwrap_or_else(|| state.config.notifications.app.clone());
    let user = take_text(&mut fields, "user").unwrap_or(principal.name);

    let payload: BTreeMap<String, String> = fields
        .into_iter()
        .map(|(name, value)| (name, text(value)))
        .collect();

    let id = state.notifications.notify(&app, &user, &payload)?;
    debug!("notification {} for {} in {}", id, user, app);
    Ok(Envelope::ok(json!({ "id": id, "app": app, "user": user })))
}

/// Remove the caller's notifications of the testing app
pub async fn delete_all(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Envelope> {
    let deleted = state
        .notifications
        .delete_all(&state.config.notifications.app, &principal.name)?;
    Ok(Envelope::ok(json!({ "deleted": deleted })))
}

fn take_text(fields: &mut Map<String, Value>, name: &str) -> Option<String> {
    fields
        .remove(name)
        .map(text)
        .filter(|v| !v.trim().is_empty())
}

fn text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
