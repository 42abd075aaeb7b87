//! Rows of the host's file properties table

use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::required;
use crate::params::{Params, int_from_any, string_from_any};
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::State;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct PropertyParams {
    #[serde(default, deserialize_with = "int_from_any")]
    pub fileid: Option<i64>,
    #[serde(default, alias = "propertyname", deserialize_with = "string_from_any")]
    pub name: Option<String>,
    #[serde(default, alias = "propertyvalue", deserialize_with = "string_from_any")]
    pub value: Option<String>,
}

pub async fn upsert_property(
    State(state): State<AppState>,
    Params(params): Params<PropertyParams>,
) -> ApiResult<Envelope> {
    let fileid = params.fileid.ok_or_else(|| ApiError::missing("fileid"))?;
    let name = required(params.name, "name")?;
    let value = params.value.unwrap_or_default();

    state.file_cache.upsert_property(fileid, &name, &value)?;
    Ok(Envelope::ok(json!({ "fileid": fileid, "name": name, "value": value })))
}
