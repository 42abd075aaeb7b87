//! Subprocess execution for host CLI commands

use crate::error::{FixtureError, Result};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use serde::Serialize;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Captured result of one command. A non-zero exit code is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command words `argv` with the extra environment `env`
    async fn run(&self, argv: &[String], env: &BTreeMap<String, String>) -> Result<CommandOutput>;
}

/// Runs `program prefix_args... argv...` as a child process
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    program: String,
    prefix_args: Vec<String>,
    working_dir: Option<Utf8PathBuf>,
}

impl ProcessRunner {
    pub fn new(program: impl Into<String>, prefix_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            prefix_args,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Build a runner from a full command line such as `["apachectl", "-M"]`.
    /// Returns `None` for an empty command line.
    pub fn from_command_line(command_line: &[String]) -> Option<Self> {
        let (program, args) = command_line.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, argv: &[String], env: &BTreeMap<String, String>) -> Result<CommandOutput> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.prefix_args)
            .args(argv)
            .envs(env)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!("running {} {:?}", self.program, argv);

        let output = command
            .output()
            .await
            .map_err(|e| FixtureError::Command(format!("failed to start {}: {e}", self.program)))?;

        Ok(CommandOutput {
            // Terminated by a signal
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
