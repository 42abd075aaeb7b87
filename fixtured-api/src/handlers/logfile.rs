//! Host log file

use crate::error::ApiResult;
use crate::handlers::utils::parse_count;
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::{Path, State};

/// The whole log
pub async fn read(State(state): State<AppState>) -> ApiResult<Envelope> {
    let entries = state.log.read_tail(None)?;
    Envelope::from_serialize(&entries)
}

/// The last `{lines}` entries
pub async fn read_lines(
    State(state): State<AppState>,
    Path(lines): Path<String>,
) -> ApiResult<Envelope> {
    let lines = usize::try_from(parse_count(&lines, "lines")?).unwrap_or(usize::MAX);
    let entries = state.log.read_tail(Some(lines))?;
    Envelope::from_serialize(&entries)
}

pub async fn clear(State(state): State<AppState>) -> ApiResult<Envelope> {
    state.log.clear()?;
    Ok(Envelope::empty())
}
