//! Mime type to file extension lookup

use crate::error::ApiResult;
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::{Path, State};

/// Extensions whose canonical mime type has the major type `{type}`
pub async fn extensions_for_type(
    State(state): State<AppState>,
    Path(mime_type): Path<String>,
) -> ApiResult<Envelope> {
    let extensions = state.mimetypes.extensions_for_type(&mime_type)?;
    Envelope::from_serialize(&extensions)
}

/// Extensions whose canonical mime type is exactly `{type}/{subtype}`
pub async fn extensions_for_type_subtype(
    State(state): State<AppState>,
    Path((mime_type, subtype)): Path<(String, String)>,
) -> ApiResult<Envelope> {
    let extensions = state
        .mimetypes
        .extensions_for_type_subtype(&mime_type, &subtype)?;
    Envelope::from_serialize(&extensions)
}
