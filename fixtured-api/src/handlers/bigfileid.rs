use crate::error::ApiResult;
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::State;
use fixtured_core::filecache::FILE_ID_32BIT_BOUNDARY;
use serde_json::json;

/// Move the file id sequence past the signed 32 bit range
pub async fn increase_file_ids(State(state): State<AppState>) -> ApiResult<Envelope> {
    let max_file_id = state
        .file_cache
        .increase_file_ids_beyond(FILE_ID_32BIT_BOUNDARY)?;
    Ok(Envelope::ok(json!({ "maxFileId": max_file_id })))
}
