//! Probes of the web server environment the host runs in

use crate::command::{CommandRunner, ProcessRunner};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::warn;

#[async_trait]
pub trait EnvironmentProbe: Send + Sync {
    /// Normalized names of the loaded web server modules
    async fn loaded_modules(&self) -> Result<Vec<String>>;

    /// Reset the opcode cache, returning whether a reset happened
    async fn reset_opcache(&self) -> Result<bool>;
}

/// `mod_rewrite`, `rewrite_module` and `rewrite` all name the same module
pub fn normalize_module_name(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    let name = name.strip_suffix(".so").unwrap_or(name.as_str());
    let name = name.strip_prefix("mod_").unwrap_or(name);
    let name = name.strip_suffix("_module").unwrap_or(name);
    name.to_string()
}

/// Parse `apachectl -M` output:
///
/// ```text
/// Loaded Modules:
///  core_module (static)
///  rewrite_module (shared)
/// ```
pub fn parse_module_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter(|word| word.ends_with("_module"))
        .map(normalize_module_name)
        .collect()
}

/// Probe backed by configured shell commands
#[derive(Debug, Clone, Default)]
pub struct CommandProbe {
    modules: Option<ProcessRunner>,
    opcache_reset: Option<ProcessRunner>,
}

impl CommandProbe {
    pub fn new(modules_command: &[String], opcache_reset_command: &[String]) -> Self {
        Self {
            modules: ProcessRunner::from_command_line(modules_command),
            opcache_reset: ProcessRunner::from_command_line(opcache_reset_command),
        }
    }
}

#[async_trait]
impl EnvironmentProbe for CommandProbe {
    async fn loaded_modules(&self) -> Result<Vec<String>> {
        let Some(runner) = &self.modules else {
            return Ok(Vec::new());
        };

        let output = runner.run(&[], &BTreeMap::new()).await?;
        if output.exit_code != 0 {
            warn!(
                "module listing exited with {}: {}",
                output.exit_code,
                output.stderr.trim()
            );
        }
        Ok(parse_module_list(&output.stdout))
    }

    async fn reset_opcache(&self) -> Result<bool> {
        let Some(runner) = &self.opcache_reset else {
            return Ok(false);
        };

        let output = runner.run(&[], &BTreeMap::new()).await?;
        if output.exit_code != 0 {
            warn!("opcache reset exited with {}", output.exit_code);
        }
        Ok(output.exit_code == 0)
    }
}
