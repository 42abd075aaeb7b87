//! Lock provisioning
//!
//! `{type}` in the routes is the resource type (`file` or `folder`), `{user}`
//! the storage owner. The resource path and the lock kind travel as the
//! `path` and `kind` parameters.

use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::required;
use crate::params::{Params, bool_from_any, string_from_any};
use crate::response::Envelope;
use crate::state::{AppState, FILELOCKING_ENABLED};
use axum::extract::{Path, State};
use fixtured_core::locking::{LockKey, LockKind, ReleaseScope, ResourceType};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LockParams {
    #[serde(default, deserialize_with = "string_from_any")]
    pub path: Option<String>,
    /// `shared`, `exclusive` or the numeric constants 1 and 2
    #[serde(default, deserialize_with = "string_from_any")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReleaseParams {
    #[serde(default, deserialize_with = "bool_from_any")]
    pub global: Option<bool>,
}

impl LockParams {
    fn key(&self, resource_type: &str, user: &str) -> ApiResult<LockKey> {
        let resource_type: ResourceType = resource_type.parse()?;
        let path = required(self.path.clone(), "path")?;
        Ok(LockKey::derive(resource_type, user, &path))
    }

    fn kind(&self) -> ApiResult<Option<LockKind>> {
        match self.kind.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(kind) => Ok(Some(kind.parse()?)),
        }
    }
}

pub async fn is_locking_enabled(State(state): State<AppState>) -> ApiResult<Envelope> {
    let enabled = state
        .config_store
        .get_system_value(FILELOCKING_ENABLED)?
        .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"));
    Ok(Envelope::ok(json!({ "enabled": enabled })))
}

pub async fn is_locked(
    State(state): State<AppState>,
    Path((resource_type, user)): Path<(String, String)>,
    Params(params): Params<LockParams>,
) -> ApiResult<Envelope> {
    let key = params.key(&resource_type, &user)?;
    let locked = state.locks.is_locked(&key, params.kind()?)?;
    Ok(Envelope::ok(json!({ "locked": locked })))
}

pub async fn acquire_lock(
    State(state): State<AppState>,
    Path((resource_type, user)): Path<(String, String)>,
    Params(params): Params<LockParams>,
) -> ApiResult<Envelope> {
    let key = params.key(&resource_type, &user)?;
    let kind = params.kind()?.unwrap_or(LockKind::Shared);

    state.locks.acquire(&key, kind, state.lock_owner())?;
    info!("{} lock acquired on {} for {}", kind, key.as_str(), user);
    Ok(Envelope::ok(json!({ "kind": kind })))
}

pub async fn change_lock(
    State(state): State<AppState>,
    Path((resource_type, user)): Path<(String, String)>,
    Params(params): Params<LockParams>,
) -> ApiResult<Envelope> {
    let key = params.key(&resource_type, &user)?;
    let kind = params.kind()?.ok_or_else(|| ApiError::missing("kind"))?;

    state.locks.change(&key, kind)?;
    Ok(Envelope::ok(json!({ "kind": kind })))
}

pub async fn release_lock(
    State(state): State<AppState>,
    Path((resource_type, user)): Path<(String, String)>,
    Params(params): Params<LockParams>,
) -> ApiResult<Envelope> {
    let key = params.key(&resource_type, &user)?;
    state.locks.release(&key)?;
    Ok(Envelope::empty())
}

/// Release every lock of one resource type
pub async fn release_all_of_type(
    State(state): State<AppState>,
    Path(resource_type): Path<String>,
    Params(params): Params<ReleaseParams>,
) -> ApiResult<Envelope> {
    let resource_type: ResourceType = resource_type.parse()?;
    release(&state, Some(resource_type), params.global.unwrap_or(false))
}

pub async fn release_all(
    State(state): State<AppState>,
    Params(params): Params<ReleaseParams>,
) -> ApiResult<Envelope> {
    release(&state, None, params.global.unwrap_or(false))
}

/// Without `global` only locks carrying our owner tag are released
fn release(
    state: &AppState,
    resource_type: Option<ResourceType>,
    global: bool,
) -> ApiResult<Envelope> {
    let scope = ReleaseScope {
        resource_type,
        owner: (!global).then(|| state.lock_owner()),
    };

    let released = state.locks.release_all(scope)?;
    info!("released {} locks (global: {})", released, global);
    Ok(Envelope::ok(json!({ "released": released })))
}
