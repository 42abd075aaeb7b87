use crate::error::{ApiError, ApiResult};
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::{Path, State};
use fixtured_core::probe::normalize_module_name;
use serde_json::json;

/// Succeeds when the web server has `{module}` loaded, 404 otherwise
pub async fn get_module(
    State(state): State<AppState>,
    Path(module): Path<String>,
) -> ApiResult<Envelope> {
    let wanted = normalize_module_name(&module);
    let loaded = state.probe.loaded_modules().await?;

    if loaded.iter().any(|m| *m == wanted) {
        Ok(Envelope::ok(json!({ "module": module, "loaded": true })))
    } else {
        Err(ApiError::NotFound(format!("module {module} is not loaded")))
    }
}
