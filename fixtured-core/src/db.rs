//! Host database
//!
//! The tables the testing endpoints read and write, kept in one SQLite file.
//! Every store opens its own connection per operation so no connection is
//! ever shared between requests.

use crate::error::Result;
use camino::Utf8Path;
use rusqlite::Connection;

#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Utf8Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;

        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS appconfig (
                appid TEXT NOT NULL,
                configkey TEXT NOT NULL,
                configvalue TEXT NOT NULL,
                PRIMARY KEY (appid, configkey)
            );

            CREATE TABLE IF NOT EXISTS systemconfig (
                configkey TEXT PRIMARY KEY,
                configvalue TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS file_locks (
                key TEXT NOT NULL,
                owner TEXT NOT NULL,
                lock INTEGER NOT NULL DEFAULT 0,
                resource_type TEXT NOT NULL,
                PRIMARY KEY (key, owner)
            );

            CREATE TABLE IF NOT EXISTS notifications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                app TEXT NOT NULL,
                user TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                payload TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS accounts (
                user_id TEXT PRIMARY KEY,
                last_login INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS filecache (
                fileid INTEGER PRIMARY KEY AUTOINCREMENT,
                storage INTEGER NOT NULL,
                path TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS properties (
                fileid INTEGER NOT NULL,
                propertyname TEXT NOT NULL,
                propertyvalue TEXT NOT NULL,
                PRIMARY KEY (fileid, propertyname)
            );

            CREATE TABLE IF NOT EXISTS trusted_servers (
                url TEXT PRIMARY KEY,
                status INTEGER NOT NULL DEFAULT 2,
                added_at INTEGER NOT NULL
            );",
        )?;
        Ok(())
    }
}

/// Current Unix time in seconds
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
