//! Host CLI (occ) execution
//!
//! A non-zero exit code is reported as data in a successful response.

use crate::error::{ApiError, ApiResult};
use crate::handlers::utils::required;
use crate::params::{Params, string_from_any};
use crate::parser::split_command;
use crate::response::Envelope;
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use fixtured_core::command::{CommandOutput, CommandRunner};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct CommandInvocation {
    pub command: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteParams {
    #[serde(default, deserialize_with = "string_from_any")]
    pub command: Option<String>,
    pub env: Option<BTreeMap<String, String>>,
}

fn runner(state: &AppState) -> ApiResult<Arc<dyn CommandRunner>> {
    state
        .occ
        .clone()
        .ok_or_else(|| ApiError::Forbidden("command execution is disabled".to_owned()))
}

async fn run(runner: &dyn CommandRunner, invocation: &CommandInvocation) -> ApiResult<CommandOutput> {
    let argv = split_command(&invocation.command).map_err(ApiError::InvalidInput)?;
    if argv.is_empty() {
        return Err(ApiError::missing("command"));
    }

    let output = runner.run(&argv, &invocation.env).await?;
    info!("occ {} exited with {}", argv[0], output.exit_code);
    Ok(output)
}

pub async fn execute(
    State(state): State<AppState>,
    Params(params): Params<ExecuteParams>,
) -> ApiResult<Envelope> {
    let runner = runner(&state)?;
    let invocation = CommandInvocation {
        command: required(params.command, "command")?,
        env: params.env.unwrap_or_default(),
    };

    let output = run(runner.as_ref(), &invocation).await?;
    Envelope::from_serialize(&output)
}

/// Body: a JSON list of `{"command": ..., "env": {...}}`, run in order. A
/// command that cannot be run yields exit code -1 with the reason on stderr
/// and does not stop the ones after it.
pub async fn bulk_execute(State(state): State<AppState>, body: Bytes) -> ApiResult<Envelope> {
    let runner = runner(&state)?;
    let invocations: Vec<CommandInvocation> = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidInput(format!("expected a list of commands: {e}")))?;

    let mut results = Vec::with_capacity(invocations.len());
    for invocation in &invocations {
        let output = match run(runner.as_ref(), invocation).await {
            Ok(output) => output,
            Err(e) => {
                warn!("bulk command '{}' not run: {}", invocation.command, e);
                CommandOutput {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: e.to_string(),
                }
            }
        };
        results.push(output);
    }

    Envelope::from_serialize(&results)
}
