use crate::error::{ApiError, ApiResult};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Failure,
}

/// Uniform body of every response
///
/// ```json
/// {"status": "ok", "statusCode": 200, "message": null, "data": {...}}
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status: Outcome,
    pub status_code: u16,
    pub message: Option<String>,
    pub data: Value,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            status: Outcome::Ok,
            status_code: StatusCode::OK.as_u16(),
            message: None,
            data,
        }
    }

    /// Success without a payload
    pub fn empty() -> Self {
        Self::ok(Value::Null)
    }

    pub fn from_serialize<T: Serialize>(data: &T) -> ApiResult<Self> {
        serde_json::to_value(data)
            .map(Self::ok)
            .map_err(|e| ApiError::UpstreamFailure(format!("failed to encode response: {e}")))
    }

    pub fn failure(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Outcome::Failure,
            status_code: status.as_u16(),
            message: Some(message.into()),
            data: Value::Null,
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ok_shape() {
        let value = serde_json::to_value(Envelope::ok(json!({"key": "a"}))).unwrap();
        assert_eq!(
            value,
            json!({"status": "ok", "statusCode": 200, "message": null, "data": {"key": "a"}})
        );
    }

    #[test]
    fn test_failure_always_has_message() {
        let envelope = Envelope::failure(StatusCode::LOCKED, "resource is locked");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["statusCode"], 423);
        assert_eq!(value["message"], "resource is locked");
        assert_eq!(envelope.into_response().status(), StatusCode::LOCKED);
    }
}
