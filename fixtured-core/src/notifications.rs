//! Notification manager of the host

use crate::db::{Database, unix_now};
use crate::error::Result;
use camino::Utf8PathBuf;
use rusqlite::params;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub app: String,
    pub user: String,
    pub timestamp: i64,
    pub payload: BTreeMap<String, String>,
}

pub trait NotificationManager: Send + Sync {
    /// Store a notification and return its id
    fn notify(&self, app: &str, user: &str, payload: &BTreeMap<String, String>) -> Result<i64>;

    /// Remove every notification of `app` for `user`, returning how many were removed
    fn delete_all(&self, app: &str, user: &str) -> Result<usize>;

    /// Read-back for tests, no route exposes it
    fn list(&self, app: &str, user: &str) -> Result<Vec<Notification>>;
}

#[derive(Debug, Clone)]
pub struct DbNotificationManager {
    db_path: Utf8PathBuf,
}

impl DbNotificationManager {
    pub fn new(db_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl NotificationManager for DbNotificationManager {
    fn notify(&self, app: &str, user: &str, payload: &BTreeMap<String, String>) -> Result<i64> {
        let db = Database::open(&self.db_path)?;
        let encoded = serde_json::to_string(payload)?;

        db.conn().execute(
            "INSERT INTO notifications (app, user, timestamp, payload) VALUES (?1, ?2, ?3, ?4)",
            params![app, user, unix_now(), encoded],
        )?;
        Ok(db.conn().last_insert_rowid())
    }

    fn delete_all(&self, app: &str, user: &str) -> Result<usize> {
        let db = Database::open(&self.db_path)?;
        Ok(db.conn().execute(
            "DELETE FROM notifications WHERE app = ?1 AND user = ?2",
            params![app, user],
        )?)
    }

    fn list(&self, app: &str, user: &str) -> Result<Vec<Notification>> {
        let db = Database::open(&self.db_path)?;
        let mut stmt = db.conn().prepare(
            "SELECT id, app, user, timestamp, payload FROM notifications
             WHERE app = ?1 AND user = ?2 ORDER BY id",
        )?;

        let rows = stmt.query_map(params![app, user], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut notifications = Vec::new();
        for row in rows {
            let (id, app, user, timestamp, payload) = row?;
            notifications.push(Notification {
                id,
                app,
                user,
                timestamp,
                payload: serde_json::from_str(&payload)?,
            });
        }
        Ok(notifications)
    }
}
