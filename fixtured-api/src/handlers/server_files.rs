//! Fixture files and directories below the fixture root

use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::required;
use crate::params::{Params, string_from_any};
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::State;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct DirParams {
    #[serde(default, deserialize_with = "string_from_any")]
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FileParams {
    #[serde(default, deserialize_with = "string_from_any")]
    pub file: Option<String>,
    #[serde(default, deserialize_with = "string_from_any")]
    pub content: Option<String>,
    /// `utf-8` (default) or `base64`
    #[serde(default, deserialize_with = "string_from_any")]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

impl ContentEncoding {
    fn parse(value: Option<&str>) -> ApiResult<Self> {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("utf-8") | Some("utf8") | Some("text") => Ok(ContentEncoding::Utf8),
            Some("base64") => Ok(ContentEncoding::Base64),
            Some(other) => Err(ApiError::InvalidInput(format!(
                "unknown encoding '{other}', expected 'utf-8' or 'base64'"
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileContent {
    pub file: String,
    pub content: String,
    pub encoding: ContentEncoding,
}

pub async fn mk_dir(
    State(state): State<AppState>,
    Params(params): Params<DirParams>,
) -> ApiResult<Envelope> {
    let dir = required(params.dir, "dir")?;
    state.files.mkdir(&dir)?;
    Ok(Envelope::ok(json!({ "dir": dir })))
}

pub async fn rm_dir(
    State(state): State<AppState>,
    Params(params): Params<DirParams>,
) -> ApiResult<Envelope> {
    let dir = required(params.dir, "dir")?;
    state.files.rmdir(&dir)?;
    Ok(Envelope::empty())
}

/// Entry names of `dir`, the fixture root when absent
pub async fn list_files(
    State(state): State<AppState>,
    Params(params): Params<DirParams>,
) -> ApiResult<Envelope> {
    let dir = params.dir.unwrap_or_else(|| "/".to_owned());
    let names = state.files.list(&dir)?;
    Envelope::from_serialize(&names)
}

pub async fn create_file(
    State(state): State<AppState>,
    Params(params): Params<FileParams>,
) -> ApiResult<Envelope> {
    let file = required(params.file, "file")?;
    let content = params.content.unwrap_or_default();

    let bytes = match ContentEncoding::parse(params.encoding.as_deref())? {
        ContentEncoding::Utf8 => content.into_bytes(),
        ContentEncoding::Base64 => STANDARD
            .decode(content.trim())
            .map_err(|e| ApiError::InvalidInput(format!("content is not valid base64: {e}")))?,
    };

    state.files.create_file(&file, &bytes)?;
    Ok(Envelope::ok(json!({ "file": file, "size": bytes.len() })))
}

pub async fn delete_file(
    State(state): State<AppState>,
    Params(params): Params<FileParams>,
) -> ApiResult<Envelope> {
    let file = required(params.file, "file")?;
    state.files.delete_file(&file)?;
    Ok(Envelope::empty())
}

/// Text comes back as is, anything that is not UTF-8 as base64
pub async fn read_file(
    State(state): State<AppState>,
    Params(params): Params<FileParams>,
) -> ApiResult<Envelope> {
    let file = required(params.file, "file")?;
    let bytes = state.files.read(&file)?;

    let (content, encoding) = match String::from_utf8(bytes) {
        Ok(text) => (text, ContentEncoding::Utf8),
        Err(e) => (STANDARD.encode(e.as_bytes()), ContentEncoding::Base64),
    };
    Envelope::from_serialize(&FileContent {
        file,
        content,
        encoding,
    })
}
