//! Last login date of accounts

use crate::error::{ApiError, ApiResult};
use crate::params::{Params, int_from_any};
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::{Path, State};
use fixtured_core::db::unix_now;
use serde::Deserialize;
use serde_json::json;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Deserialize)]
pub struct LastLoginParams {
    /// Unix seconds
    #[serde(default, deserialize_with = "int_from_any")]
    pub timestamp: Option<i64>,
    /// Days before now; ignored when `timestamp` is given
    #[serde(default, deserialize_with = "int_from_any")]
    pub days: Option<i64>,
}

impl LastLoginParams {
    fn resolve(&self, now: i64) -> ApiResult<i64> {
        match (self.timestamp, self.days) {
            (Some(timestamp), _) if timestamp >= 0 => Ok(timestamp),
            (Some(timestamp), _) => Err(ApiError::InvalidInput(format!(
                "timestamp must not be negative: {timestamp}"
            ))),
            (None, Some(days)) => days
                .checked_mul(SECONDS_PER_DAY)
                .and_then(|offset| now.checked_sub(offset))
                .ok_or_else(|| ApiError::InvalidInput(format!("days out of range: {days}"))),
            (None, None) => Err(ApiError::missing("timestamp or days")),
        }
    }
}

pub async fn set_last_login_date(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Params(params): Params<LastLoginParams>,
) -> ApiResult<Envelope> {
    let last_login = params.resolve(unix_now())?;
    state.accounts.set_last_login(&user, last_login)?;
    Ok(Envelope::ok(json!({ "user": user, "lastLogin": last_login })))
}

pub async fn get_last_login_date(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> ApiResult<Envelope> {
    let last_login = state.accounts.get_last_login(&user)?;
    Ok(Envelope::ok(json!({ "user": user, "lastLogin": last_login })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(timestamp: Option<i64>, days: Option<i64>) -> LastLoginParams {
        LastLoginParams { timestamp, days }
    }

    #[test]
    fn test_resolve() {
        let now = 1_700_000_000;
        assert_eq!(params(Some(5), Some(3)).resolve(now).unwrap(), 5);
        assert_eq!(params(None, Some(2)).resolve(now).unwrap(), now - 2 * SECONDS_PER_DAY);
        assert!(params(None, None).resolve(now).is_err());
        assert!(params(Some(-1), None).resolve(now).is_err());
        assert!(params(None, Some(i64::MAX)).resolve(now).is_err());
    }
}
