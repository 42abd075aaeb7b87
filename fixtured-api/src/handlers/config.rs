//! App configuration values
//!
//! Single values live under `/app/{appid}/{configkey}`, all values of one app
//! under `/app/{appid}`. `/apps` takes a `values` list for bulk changes; list
//! entries that are not objects or lack a field are skipped and counted.

use crate::error::{ApiError, ApiResult};
use crate::params::{Params, string_from_any};
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::{Path, State};
use fixtured_core::appconfig::ConfigEntry;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct ValueParams {
    #[serde(default, deserialize_with = "string_from_any")]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkParams {
    pub values: Option<Value>,
}

pub async fn set_value(
    State(state): State<AppState>,
    Path((app, key)): Path<(String, String)>,
    Params(params): Params<ValueParams>,
) -> ApiResult<Envelope> {
    let value = params.value.ok_or_else(|| ApiError::missing("value"))?;
    state.config_store.set_app_value(&app, &key, &value)?;
    debug!("set {}/{}", app, key);
    Ok(Envelope::empty())
}

pub async fn delete_value(
    State(state): State<AppState>,
    Path((app, key)): Path<(String, String)>,
) -> ApiResult<Envelope> {
    state.config_store.delete_app_value(&app, &key)?;
    Ok(Envelope::empty())
}

pub async fn get_value(
    State(state): State<AppState>,
    Path((app, key)): Path<(String, String)>,
) -> ApiResult<Envelope> {
    let value = state.config_store.get_app_value(&app, &key)?;
    Envelope::from_serialize(&ConfigEntry { app, key, value })
}

pub async fn get_values(
    State(state): State<AppState>,
    Path(app): Path<String>,
) -> ApiResult<Envelope> {
    let mut entries = Vec::new();
    for key in state.config_store.get_app_keys(&app)? {
        let value = state.config_store.get_app_value(&app, &key)?;
        entries.push(ConfigEntry {
            app: app.clone(),
            key,
            value,
        });
    }
    Envelope::from_serialize(&entries)
}

pub async fn set_values(
    State(state): State<AppState>,
    Params(params): Params<BulkParams>,
) -> ApiResult<Envelope> {
    let entries = value_list(params.values)?;
    let (mut applied, mut skipped) = (0usize, 0usize);

    for entry in &entries {
        let fields = entry.as_object();
        let app = fields.and_then(|f| field(f, &["app", "appid"]));
        let key = fields.and_then(|f| field(f, &["key", "configkey"]));
        let value = fields.and_then(|f| field(f, &["value"]));

        match (app, key, value) {
            (Some(app), Some(key), Some(value)) => {
                state.config_store.set_app_value(&app, &key, &value)?;
                applied += 1;
            }
            _ => skipped += 1,
        }
    }

    info!("bulk set: {} applied, {} skipped", applied, skipped);
    Ok(Envelope::ok(json!({ "applied": applied, "skipped": skipped })))
}

pub async fn delete_values(
    State(state): State<AppState>,
    Params(params): Params<BulkParams>,
) -> ApiResult<Envelope> {
    let entries = value_list(params.values)?;
    let (mut applied, mut skipped) = (0usize, 0usize);

    for entry in &entries {
        let fields = entry.as_object();
        let app = fields.and_then(|f| field(f, &["app", "appid"]));
        let key = fields.and_then(|f| field(f, &["key", "configkey"]));

        match (app, key) {
            (Some(app), Some(key)) => {
                state.config_store.delete_app_value(&app, &key)?;
                applied += 1;
            }
            _ => skipped += 1,
        }
    }

    info!("bulk delete: {} applied, {} skipped", applied, skipped);
    Ok(Envelope::ok(json!({ "applied": applied, "skipped": skipped })))
}

fn value_list(values: Option<Value>) -> ApiResult<Vec<Value>> {
    match values {
        Some(Value::Array(entries)) => Ok(entries),
        Some(_) => Err(ApiError::InvalidInput("values must be a list".to_owned())),
        None => Err(ApiError::missing("values")),
    }
}

/// First of `names` present with a scalar value
fn field(fields: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match fields.get(*name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
