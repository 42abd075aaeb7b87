//! Host log file access

use crate::config::Config;
use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io;

/// Name of the host log inside the data directory
pub const DEFAULT_LOG_NAME: &str = "owncloud.log";

#[derive(Debug, Clone)]
pub struct HostLog {
    path: Utf8PathBuf,
}

impl HostLog {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        let path = config
            .general
            .log_file
            .clone()
            .unwrap_or_else(|| config.general.data_directory.join(DEFAULT_LOG_NAME));
        Self::new(path)
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// The last `lines` entries, or all of them. The host writes one JSON
    /// object per line; lines that are not JSON come back as strings.
    pub fn read_tail(&self, lines: Option<usize>) -> Result<Vec<Value>> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let text = String::from_utf8_lossy(&raw);

        let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let skip = lines.map_or(0, |n| all.len().saturating_sub(n));

        Ok(all[skip..]
            .iter()
            .map(|line| {
                serde_json::from_str(line).unwrap_or_else(|_| Value::String((*line).to_string()))
            })
            .collect())
    }

    /// Truncate the log in place; a missing log is already clear
    pub fn clear(&self) -> Result<()> {
        match OpenOptions::new().write(true).truncate(true).open(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn log_with(content: &str) -> (tempfile::TempDir, HostLog) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("owncloud.log")).unwrap();
        fs::write(&path, content).unwrap();
        (dir, HostLog::new(path))
    }

    #[test]
    fn test_tail_decodes_json_lines() {
        let (_dir, log) = log_with("{\"level\":1,\"message\":\"one\"}\nplain text\n{\"level\":3,\"message\":\"three\"}\n");

        let all = log.read_tail(None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[1], json!("plain text"));

        let last = log.read_tail(Some(1)).unwrap();
        assert_eq!(last, vec![json!({"level": 3, "message": "three"})]);

        assert_eq!(log.read_tail(Some(10)).unwrap().len(), 3);
        assert!(log.read_tail(Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_clear_truncates() {
        let (_dir, log) = log_with("line\n");
        log.clear().unwrap();
        assert!(log.path().exists());
        assert!(log.read_tail(None).unwrap().is_empty());
    }

    #[test]
    fn test_missing_log_is_empty() {
        let log = HostLog::new("/nonexistent/fixtured/owncloud.log");
        assert!(log.read_tail(None).unwrap().is_empty());
        log.clear().unwrap();
    }
}
