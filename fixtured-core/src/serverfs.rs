//! Fixture files and directories under a fixed root
//!
//! Every path handed to [`FixtureRoot`] is relative to the root. A leading `/`
//! is ignored, `..` components are rejected, and the resolved target must stay
//! inside the root after following symlinks.

use crate::error::{FixtureError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct FixtureRoot {
    root: Utf8PathBuf,
}

impl FixtureRoot {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.root
    }

    /// Resolve a caller supplied relative path to an absolute one under the root
    pub fn resolve(&self, relative: &str) -> Result<Utf8PathBuf> {
        let mut clean = Utf8PathBuf::new();
        for component in Utf8Path::new(relative.trim_start_matches('/')).components() {
            match component {
                Utf8Component::Normal(part) => clean.push(part),
                Utf8Component::CurDir => {}
                Utf8Component::ParentDir => {
                    return Err(FixtureError::InvalidInput(format!(
                        "path must not contain '..': {relative}"
                    )));
                }
                Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                    return Err(FixtureError::InvalidInput(format!(
                        "path must be relative: {relative}"
                    )));
                }
            }
        }

        let resolved = self.root.join(&clean);
        self.ensure_contained(&resolved, relative)?;
        Ok(resolved)
    }

    /// Symlinks on the way to `path` must not lead out of the root
    fn ensure_contained(&self, path: &Utf8Path, relative: &str) -> Result<()> {
        let root = self.root.canonicalize_utf8()?;

        let mut existing = path;
        while existing.symlink_metadata().is_err() {
            match existing.parent() {
                Some(parent) => existing = parent,
                None => return Ok(()),
            }
        }

        let escapes = match existing.canonicalize_utf8() {
            Ok(target) => !target.starts_with(&root),
            // Dangling symlink
            Err(_) => true,
        };
        if escapes {
            return Err(FixtureError::InvalidInput(format!(
                "path escapes the fixture root: {relative}"
            )));
        }
        Ok(())
    }

    fn resolve_below_root(&self, relative: &str) -> Result<Utf8PathBuf> {
        let path = self.resolve(relative)?;
        if path == self.root {
            return Err(FixtureError::InvalidInput(
                "operation not allowed on the fixture root".to_owned(),
            ));
        }
        Ok(path)
    }

    /// Create a directory and its parents; an existing directory is fine
    pub fn mkdir(&self, relative: &str) -> Result<Utf8PathBuf> {
        let path = self.resolve_below_root(relative)?;
        fs::create_dir_all(&path).map_err(|e| io_error(e, relative))?;
        debug!("created directory {}", path);
        Ok(path)
    }

    /// Remove a directory with everything inside it
    pub fn rmdir(&self, relative: &str) -> Result<()> {
        let path = self.resolve_below_root(relative)?;
        let metadata = fs::symlink_metadata(&path).map_err(|e| io_error(e, relative))?;
        if !metadata.is_dir() {
            return Err(FixtureError::InvalidInput(format!(
                "not a directory: {relative}"
            )));
        }

        fs::remove_dir_all(&path).map_err(|e| io_error(e, relative))?;
        debug!("removed directory {}", path);
        Ok(())
    }

    /// Write a file, creating missing parent directories
    pub fn create_file(&self, relative: &str, content: &[u8]) -> Result<Utf8PathBuf> {
        let path = self.resolve_below_root(relative)?;
        if path.is_dir() {
            return Err(FixtureError::InvalidInput(format!(
                "a directory exists at {relative}"
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(e, relative))?;
        }

        fs::write(&path, content).map_err(|e| io_error(e, relative))?;
        debug!("created file {} ({} bytes)", path, content.len());
        Ok(path)
    }

    pub fn delete_file(&self, relative: &str) -> Result<()> {
        let path = self.resolve_below_root(relative)?;
        let metadata = fs::symlink_metadata(&path).map_err(|e| io_error(e, relative))?;
        if metadata.is_dir() {
            return Err(FixtureError::InvalidInput(format!(
                "is a directory: {relative}"
            )));
        }

        fs::remove_file(&path).map_err(|e| io_error(e, relative))?;
        Ok(())
    }

    /// Entry names of a directory in lexical order
    pub fn list(&self, relative: &str) -> Result<Vec<String>> {
        let path = self.resolve(relative)?;
        let entries = fs::read_dir(&path).map_err(|e| io_error(e, relative))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => debug!("skipping non UTF-8 entry {:?}", name),
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn read(&self, relative: &str) -> Result<Vec<u8>> {
        let path = self.resolve_below_root(relative)?;
        if path.is_dir() {
            return Err(FixtureError::InvalidInput(format!(
                "is a directory: {relative}"
            )));
        }
        fs::read(&path).map_err(|e| io_error(e, relative))
    }
}

fn io_error(err: io::Error, relative: &str) -> FixtureError {
    match err.kind() {
        io::ErrorKind::NotFound => FixtureError::NotFound(format!("no such file or directory: {relative}")),
        io::ErrorKind::NotADirectory => FixtureError::InvalidInput(format!("not a directory: {relative}")),
        io::ErrorKind::PermissionDenied => FixtureError::PermissionDenied(relative.to_string()),
        _ => FixtureError::Io(err),
    }
}
