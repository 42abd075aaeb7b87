//! User accounts and their last login time

use crate::db::Database;
use crate::error::{FixtureError, Result};
use camino::Utf8PathBuf;
use rusqlite::{OptionalExtension, params};

pub trait AccountStore: Send + Sync {
    /// Create the account if it does not exist yet
    fn ensure_account(&self, user: &str) -> Result<()>;

    fn set_last_login(&self, user: &str, timestamp: i64) -> Result<()>;

    fn get_last_login(&self, user: &str) -> Result<i64>;
}

#[derive(Debug, Clone)]
pub struct DbAccountStore {
    db_path: Utf8PathBuf,
}

impl DbAccountStore {
    pub fn new(db_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl AccountStore for DbAccountStore {
    fn ensure_account(&self, user: &str) -> Result<()> {
        Database::open(&self.db_path)?.conn().execute(
            "INSERT OR IGNORE INTO accounts (user_id, last_login) VALUES (?1, 0)",
            params![user],
        )?;
        Ok(())
    }

    fn set_last_login(&self, user: &str, timestamp: i64) -> Result<()> {
        let updated = Database::open(&self.db_path)?.conn().execute(
            "UPDATE accounts SET last_login = ?2 WHERE user_id = ?1",
            params![user, timestamp],
        )?;

        if updated == 0 {
            return Err(FixtureError::NotFound(format!("user {user} does not exist")));
        }
        Ok(())
    }

    fn get_last_login(&self, user: &str) -> Result<i64> {
        Database::open(&self.db_path)?
            .conn()
            .query_row(
                "SELECT last_login FROM accounts WHERE user_id = ?1",
                params![user],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| FixtureError::NotFound(format!("user {user} does not exist")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_login_requires_account() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("host.db")).unwrap();
        let store = DbAccountStore::new(path);

        assert!(matches!(
            store.set_last_login("ghost", 10),
            Err(FixtureError::NotFound(_))
        ));
        assert!(matches!(store.get_last_login("ghost"), Err(FixtureError::NotFound(_))));

        store.ensure_account("alice").unwrap();
        assert_eq!(store.get_last_login("alice").unwrap(), 0);

        store.set_last_login("alice", 1_700_000_000).unwrap();
        store.ensure_account("alice").unwrap();
        assert_eq!(store.get_last_login("alice").unwrap(), 1_700_000_000);
    }
}
