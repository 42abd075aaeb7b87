//! HTTP Basic authentication against the configured users

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fixtured_core::config::UserConfig;
use std::collections::HashMap;
use tracing::debug;

/// Authenticated caller, available to handlers as a request extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub admin: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<String, UserConfig>,
}

impl UserDirectory {
    pub fn new(users: &[UserConfig]) -> Self {
        Self {
            users: users
                .iter()
                .map(|user| (user.name.clone(), user.clone()))
                .collect(),
        }
    }

    /// Check the `Authorization` header of a request
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Principal, ApiError> {
        let header = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_owned()))?;

        let (name, password) = decode_basic(header)
            .ok_or_else(|| ApiError::Unauthorized("malformed basic credentials".to_owned()))?;

        match self.users.get(&name) {
            Some(user) if user.password == password => Ok(Principal {
                name,
                admin: user.admin,
            }),
            _ => {
                debug!("rejected credentials for {}", name);
                Err(ApiError::Unauthorized("invalid credentials".to_owned()))
            }
        }
    }
}

fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (name, password) = decoded.split_once(':')?;
    Some((name.to_string(), password.to_string()))
}

/// Any configured user may pass
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = state.users.authenticate(request.headers())?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Only administrators may pass
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = state.users.authenticate(request.headers())?;
    if !principal.admin {
        return Err(ApiError::Forbidden(format!(
            "{} is not an administrator",
            principal.name
        )));
    }
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
