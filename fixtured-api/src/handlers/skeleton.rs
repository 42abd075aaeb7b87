//! Skeleton directory copied into new user homes

use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::required;
use crate::params::{Params, string_from_any};
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::State;
use camino::{Utf8Component, Utf8Path};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

/// System value naming the skeleton directory
pub const SKELETON_DIRECTORY: &str = "skeletondirectory";

#[derive(Debug, Deserialize)]
pub struct SkeletonParams {
    /// Name of a directory directly below the skeleton root
    #[serde(default, deserialize_with = "string_from_any")]
    pub directory: Option<String>,
}

pub async fn get(State(state): State<AppState>) -> ApiResult<Envelope> {
    let directory = state.config_store.get_system_value(SKELETON_DIRECTORY)?;
    Ok(Envelope::ok(json!({ "directory": directory })))
}

pub async fn set(
    State(state): State<AppState>,
    Params(params): Params<SkeletonParams>,
) -> ApiResult<Envelope> {
    let name = required(params.directory, "directory")?;
    let root = state
        .config
        .general
        .skeleton_root
        .as_ref()
        .ok_or_else(|| ApiError::Forbidden("no skeleton root configured".to_owned()))?;

    let mut components = Utf8Path::new(name.trim_matches('/')).components();
    let (Some(Utf8Component::Normal(_)), None) = (components.next(), components.next()) else {
        return Err(ApiError::InvalidInput(format!(
            "skeleton directory must be a plain name: {name}"
        )));
    };

    let directory = root.join(name.trim_matches('/'));
    if !directory.is_dir() {
        return Err(ApiError::NotFound(format!(
            "no skeleton directory named {name}"
        )));
    }

    state
        .config_store
        .set_system_value(SKELETON_DIRECTORY, directory.as_str())?;
    info!("skeleton directory set to {}", directory);
    Ok(Envelope::ok(json!({ "directory": directory.as_str() })))
}
