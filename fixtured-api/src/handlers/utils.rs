//! Shared helpers for handlers

use crate::error::{ApiError, ApiResult};

/// A parameter that must be present and non-empty
pub fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::missing(name)),
    }
}

/// Non-negative integer from a path segment
pub fn parse_count(segment: &str, name: &str) -> ApiResult<u64> {
    segment
        .trim()
        .parse()
        .map_err(|_| ApiError::InvalidInput(format!("{name} must be a non-negative integer: {segment}")))
}
