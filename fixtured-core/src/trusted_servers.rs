//! Federation trusted servers of the host

use crate::db::{Database, unix_now};
use crate::error::{FixtureError, Result};
use camino::Utf8PathBuf;
use rusqlite::params;
use serde::Serialize;

/// Status the host assigns to a server it has not yet exchanged secrets with
pub const STATUS_PENDING: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrustedServer {
    pub url: String,
    pub status: i64,
}

pub trait TrustedServerStore: Send + Sync {
    fn list(&self) -> Result<Vec<TrustedServer>>;

    fn add(&self, url: &str) -> Result<TrustedServer>;

    fn remove(&self, url: &str) -> Result<()>;

    fn remove_all(&self) -> Result<usize>;
}

/// Trailing slashes and surrounding whitespace do not distinguish servers
pub fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

#[derive(Debug, Clone)]
pub struct DbTrustedServerStore {
    db_path: Utf8PathBuf,
}

impl DbTrustedServerStore {
    pub fn new(db_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl TrustedServerStore for DbTrustedServerStore {
    fn list(&self) -> Result<Vec<TrustedServer>> {
        let db = Database::open(&self.db_path)?;
        let mut stmt = db
            .conn()
            .prepare("SELECT url, status FROM trusted_servers ORDER BY added_at, url")?;

        let rows = stmt.query_map([], |row| {
            Ok(TrustedServer {
                url: row.get(0)?,
                status: row.get(1)?,
            })
        })?;

        let mut servers = Vec::new();
        for row in rows {
            servers.push(row?);
        }
        Ok(servers)
    }

    fn add(&self, url: &str) -> Result<TrustedServer> {
        let url = normalize_url(url);
        if url.is_empty() {
            return Err(FixtureError::InvalidInput("url must not be empty".to_owned()));
        }

        let inserted = Database::open(&self.db_path)?.conn().execute(
            "INSERT OR IGNORE INTO trusted_servers (url, status, added_at) VALUES (?1, ?2, ?3)",
            params![url, STATUS_PENDING, unix_now()],
        )?;

        if inserted == 0 {
            return Err(FixtureError::InvalidInput(format!("{url} is already trusted")));
        }
        Ok(TrustedServer {
            url,
            status: STATUS_PENDING,
        })
    }

    fn remove(&self, url: &str) -> Result<()> {
        let url = normalize_url(url);
        let removed = Database::open(&self.db_path)?
            .conn()
            .execute("DELETE FROM trusted_servers WHERE url = ?1", params![url])?;

        if removed == 0 {
            return Err(FixtureError::NotFound(format!("{url} is not a trusted server")));
        }
        Ok(())
    }

    fn remove_all(&self) -> Result<usize> {
        Ok(Database::open(&self.db_path)?
            .conn()
            .execute("DELETE FROM trusted_servers", [])?)
    }
}
