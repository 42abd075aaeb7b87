//! File cache ids and file properties of the host

use crate::db::Database;
use crate::error::Result;
use camino::Utf8PathBuf;
use rusqlite::{OptionalExtension, params};
use tracing::info;

/// First file id that does not fit into a signed 32 bit column
pub const FILE_ID_32BIT_BOUNDARY: i64 = 1 << 32;

pub trait FileCache: Send + Sync {
    /// Move the file id sequence to at least `floor`, returning the highest id
    /// the sequence has handed out afterwards
    fn increase_file_ids_beyond(&self, floor: i64) -> Result<i64>;

    /// Insert a cache entry and return its file id. No route creates entries;
    /// tests use this to observe where the id sequence stands.
    fn insert_entry(&self, storage: i64, path: &str) -> Result<i64>;

    fn upsert_property(&self, fileid: i64, name: &str, value: &str) -> Result<()>;

    /// Read-back for tests, no route exposes it
    fn get_property(&self, fileid: i64, name: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone)]
pub struct DbFileCache {
    db_path: Utf8PathBuf,
}

impl DbFileCache {
    pub fn new(db_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl FileCache for DbFileCache {
    fn increase_file_ids_beyond(&self, floor: i64) -> Result<i64> {
        let mut db = Database::open(&self.db_path)?;
        let tx = db.conn_mut().transaction()?;

        let sequence: i64 = tx
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = 'filecache'",
                [],
                |row| row.get(0),
            )
            .optional()?
            .unwrap_or(0);

        if sequence >= floor {
            return Ok(sequence);
        }

        // A marker row at the floor moves the AUTOINCREMENT sequence; the row
        // itself is not kept.
        tx.execute(
            "INSERT INTO filecache (fileid, storage, path) VALUES (?1, 0, '__fixtured_marker__')",
            params![floor],
        )?;
        tx.execute("DELETE FROM filecache WHERE fileid = ?1", params![floor])?;
        tx.commit()?;

        info!("file id sequence moved from {} to {}", sequence, floor);
        Ok(floor)
    }

    fn insert_entry(&self, storage: i64, path: &str) -> Result<i64> {
        let db = Database::open(&self.db_path)?;
        db.conn().execute(
            "INSERT INTO filecache (storage, path) VALUES (?1, ?2)",
            params![storage, path],
        )?;
        Ok(db.conn().last_insert_rowid())
    }

    fn upsert_property(&self, fileid: i64, name: &str, value: &str) -> Result<()> {
        Database::open(&self.db_path)?.conn().execute(
            "INSERT INTO properties (fileid, propertyname, propertyvalue) VALUES (?1, ?2, ?3)
             ON CONFLICT(fileid, propertyname) DO UPDATE SET propertyvalue = excluded.propertyvalue",
            params![fileid, name, value],
        )?;
        Ok(())
    }

    fn get_property(&self, fileid: i64, name: &str) -> Result<Option<String>> {
        Ok(Database::open(&self.db_path)?
            .conn()
            .query_row(
                "SELECT propertyvalue FROM properties WHERE fileid = ?1 AND propertyname = ?2",
                params![fileid, name],
                |row| row.get(0),
            )
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (tempfile::TempDir, DbFileCache) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("host.db")).unwrap();
        (dir, DbFileCache::new(path))
    }

    #[test]
    fn test_ids_after_increase_exceed_32_bits() {
        let (_dir, cache) = cache();
        assert!(cache.insert_entry(1, "files/a.txt").unwrap() < FILE_ID_32BIT_BOUNDARY);

        let floor = cache.increase_file_ids_beyond(FILE_ID_32BIT_BOUNDARY).unwrap();
        assert_eq!(floor, FILE_ID_32BIT_BOUNDARY);

        let id = cache.insert_entry(1, "files/b.txt").unwrap();
        assert!(id > FILE_ID_32BIT_BOUNDARY);
    }

    #[test]
    fn test_increase_is_idempotent() {
        let (_dir, cache) = cache();
        cache.increase_file_ids_beyond(FILE_ID_32BIT_BOUNDARY).unwrap();
        let id = cache.insert_entry(1, "files/c.txt").unwrap();

        assert_eq!(cache.increase_file_ids_beyond(FILE_ID_32BIT_BOUNDARY).unwrap(), id);
    }

    #[test]
    fn test_property_upsert() {
        let (_dir, cache) = cache();
        cache.upsert_property(7, "{http://owncloud.org/ns}favorite", "1").unwrap();
        cache.upsert_property(7, "{http://owncloud.org/ns}favorite", "0").unwrap();

        assert_eq!(
            cache.get_property(7, "{http://owncloud.org/ns}favorite").unwrap().as_deref(),
            Some("0")
        );
        assert_eq!(cache.get_property(8, "{http://owncloud.org/ns}favorite").unwrap(), None);
    }
}
