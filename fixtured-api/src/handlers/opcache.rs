use crate::error::ApiResult;
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::State;
use serde_json::json;

pub async fn reset(State(state): State<AppState>) -> ApiResult<Envelope> {
    let reset = state.probe.reset_opcache().await?;
    Ok(Envelope::ok(json!({ "reset": reset })))
}
