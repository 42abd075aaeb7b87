//! File extension to mime type table of the host

use crate::error::{FixtureError, Result};
use camino::Utf8PathBuf;
use serde_json::{Map, Value};
use tracing::warn;

/// Table shipped with the host
pub const DIST_MAPPING: &str = include_str!("../resources/mimetypemapping.dist.json");

/// Host side override merged over [`DIST_MAPPING`]
pub const CUSTOM_MAPPING_FILE: &str = "mimetypemapping.json";

/// Extension and its mime types, canonical type first
pub type MimeMapping = (String, Vec<String>);

pub trait MimeTypeMappings: Send + Sync {
    /// Every mapping in table order
    fn all_mappings(&self) -> Result<Vec<MimeMapping>>;

    /// Extensions whose canonical mime type is `mime_type/...`
    fn extensions_for_type(&self, mime_type: &str) -> Result<Vec<String>> {
        let prefix = format!("{mime_type}/");
        Ok(self
            .all_mappings()?
            .into_iter()
            .filter(|(_, mimes)| mimes.first().is_some_and(|m| m.starts_with(&prefix)))
            .map(|(ext, _)| ext)
            .collect())
    }

    /// Extensions whose canonical mime type is exactly `mime_type/subtype`
    fn extensions_for_type_subtype(&self, mime_type: &str, subtype: &str) -> Result<Vec<String>> {
        let full = format!("{mime_type}/{subtype}");
        Ok(self
            .all_mappings()?
            .into_iter()
            .filter(|(_, mimes)| mimes.first().is_some_and(|m| *m == full))
            .map(|(ext, _)| ext)
            .collect())
    }
}

/// Dist table plus the optional override file in the host config directory.
/// The override is read on every lookup.
#[derive(Debug, Clone, Default)]
pub struct FileMimeTypeMappings {
    host_config_dir: Option<Utf8PathBuf>,
}

impl FileMimeTypeMappings {
    pub fn new(host_config_dir: Option<Utf8PathBuf>) -> Self {
        Self { host_config_dir }
    }
}

impl MimeTypeMappings for FileMimeTypeMappings {
    fn all_mappings(&self) -> Result<Vec<MimeMapping>> {
        let mut table = parse_table(DIST_MAPPING)?;

        if let Some(dir) = &self.host_config_dir {
            let custom = dir.join(CUSTOM_MAPPING_FILE);
            if custom.exists() {
                let content = std::fs::read_to_string(&custom)?;
                // Overridden keys keep their position, new keys go last
                for (ext, mimes) in parse_table(&content)? {
                    table.insert(ext, mimes);
                }
            }
        }

        Ok(table
            .into_iter()
            .filter(|(ext, _)| !ext.starts_with("_comment"))
            .filter_map(|(ext, value)| match mime_list(&value) {
                Some(mimes) => Some((ext, mimes)),
                None => {
                    warn!("ignoring malformed mime mapping for {}", ext);
                    None
                }
            })
            .collect())
    }
}

fn parse_table(json: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(json)? {
        Value::Object(map) => Ok(map),
        _ => Err(FixtureError::InvalidInput(
            "mime type mapping must be a JSON object".to_owned(),
        )),
    }
}

fn mime_list(value: &Value) -> Option<Vec<String>> {
    let mimes: Vec<String> = value
        .as_array()?
        .iter()
        .map(|m| m.as_str().map(str::to_string))
        .collect::<Option<_>>()?;
    (!mimes.is_empty()).then_some(mimes)
}
