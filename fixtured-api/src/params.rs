//! Request parameter binding
//!
//! Handlers read their parameters from the query string and the request body
//! together. The body may be JSON or `application/x-www-form-urlencoded`; when
//! a name appears in both places the body wins.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Query and body parameters deserialized into `T`
#[derive(Debug, Clone)]
pub struct Params<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Params<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let query = req.uri().query().map(str::to_owned);
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let body = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidInput(e.body_text()))?;

        let mut merged = Map::new();
        if let Some(query) = query {
            merge_pairs(&mut merged, &query)?;
        }

        if !body.iter().all(u8::is_ascii_whitespace) {
            if is_form {
                let text = std::str::from_utf8(&body)
                    .map_err(|_| ApiError::InvalidInput("form body is not UTF-8".to_owned()))?;
                merge_pairs(&mut merged, text)?;
            } else {
                match serde_json::from_slice(&body) {
                    Ok(Value::Object(fields)) => merged.extend(fields),
                    Ok(_) => {
                        return Err(ApiError::InvalidInput(
                            "request body must be a JSON object".to_owned(),
                        ));
                    }
                    Err(e) => {
                        return Err(ApiError::InvalidInput(format!("malformed JSON body: {e}")));
                    }
                }
            }
        }

        serde_json::from_value(Value::Object(merged))
            .map(Params)
            .map_err(|e| ApiError::InvalidInput(e.to_string()))
    }
}

fn merge_pairs(merged: &mut Map<String, Value>, encoded: &str) -> Result<(), ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(encoded)
        .map_err(|e| ApiError::InvalidInput(format!("malformed parameters: {e}")))?;
    for (name, value) in pairs {
        merged.insert(name, Value::String(value));
    }
    Ok(())
}

/// Form and query values arrive as strings, JSON values may be numbers
pub fn int_from_any<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("{n} is not an integer"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("{s} is not an integer"))),
        Some(other) => Err(de::Error::custom(format!("{other} is not an integer"))),
    }
}

/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` as strings or JSON values
pub fn bool_from_any<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(Value::Number(n)) => Ok(Some(n.as_i64() != Some(0))),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            other => Err(de::Error::custom(format!("{other} is not a boolean"))),
        },
        Some(other) => Err(de::Error::custom(format!("{other} is not a boolean"))),
    }
}

/// Scalars are kept as text, `null` stays absent
pub fn string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(de::Error::custom(format!("{other} is not a scalar"))),
    }
}
