//! App and system configuration values of the host

use crate::db::Database;
use crate::error::Result;
use camino::Utf8PathBuf;
use rusqlite::{OptionalExtension, params};
use serde::Serialize;

/// A single app configuration value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigEntry {
    pub app: String,
    pub key: String,
    pub value: Option<String>,
}

pub trait ConfigStore: Send + Sync {
    fn set_app_value(&self, app: &str, key: &str, value: &str) -> Result<()>;

    fn get_app_value(&self, app: &str, key: &str) -> Result<Option<String>>;

    /// Returns whether a value was removed
    fn delete_app_value(&self, app: &str, key: &str) -> Result<bool>;

    /// All keys stored for `app`, ordered by key
    fn get_app_keys(&self, app: &str) -> Result<Vec<String>>;

    fn set_system_value(&self, key: &str, value: &str) -> Result<()>;

    fn get_system_value(&self, key: &str) -> Result<Option<String>>;
}

/// Config store backed by the `appconfig` and `systemconfig` tables
#[derive(Debug, Clone)]
pub struct DbConfigStore {
    db_path: Utf8PathBuf,
}

impl DbConfigStore {
    pub fn new(db_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn open(&self) -> Result<Database> {
        Database::open(&self.db_path)
    }
}

impl ConfigStore for DbConfigStore {
    fn set_app_value(&self, app: &str, key: &str, value: &str) -> Result<()> {
        self.open()?.conn().execute(
            "INSERT OR REPLACE INTO appconfig (appid, configkey, configvalue) VALUES (?1, ?2, ?3)",
            params![app, key, value],
        )?;
        Ok(())
    }

    fn get_app_value(&self, app: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .open()?
            .conn()
            .query_row(
                "SELECT configvalue FROM appconfig WHERE appid = ?1 AND configkey = ?2",
                params![app, key],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn delete_app_value(&self, app: &str, key: &str) -> Result<bool> {
        let removed = self.open()?.conn().execute(
            "DELETE FROM appconfig WHERE appid = ?1 AND configkey = ?2",
            params![app, key],
        )?;
        Ok(removed > 0)
    }

    fn get_app_keys(&self, app: &str) -> Result<Vec<String>> {
        let db = self.open()?;
        let mut stmt = db
            .conn()
            .prepare("SELECT configkey FROM appconfig WHERE appid = ?1 ORDER BY configkey")?;

        let rows = stmt.query_map(params![app], |row| row.get(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn set_system_value(&self, key: &str, value: &str) -> Result<()> {
        self.open()?.conn().execute(
            "INSERT OR REPLACE INTO systemconfig (configkey, configvalue) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_system_value(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .open()?
            .conn()
            .query_row(
                "SELECT configvalue FROM systemconfig WHERE configkey = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }
}
