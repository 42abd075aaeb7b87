//! Federation trusted servers

use crate::error::ApiResult;
use crate::handlers::utils::required;
use crate::params::{Params, string_from_any};
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ServerParams {
    #[serde(default, deserialize_with = "string_from_any")]
    pub url: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Envelope> {
    let servers = state.trusted_servers.list()?;
    Envelope::from_serialize(&servers)
}

pub async fn add(
    State(state): State<AppState>,
    Params(params): Params<ServerParams>,
) -> ApiResult<Envelope> {
    let url = required(params.url, "url")?;
    let server = state.trusted_servers.add(&url)?;
    Envelope::from_serialize(&server)
}

pub async fn remove(
    State(state): State<AppState>,
    Params(params): Params<ServerParams>,
) -> ApiResult<Envelope> {
    let url = required(params.url, "url")?;
    state.trusted_servers.remove(&url)?;
    Ok(Envelope::empty())
}

pub async fn remove_all(State(state): State<AppState>) -> ApiResult<Envelope> {
    let removed = state.trusted_servers.remove_all()?;
    Ok(Envelope::ok(json!({ "removed": removed })))
}
