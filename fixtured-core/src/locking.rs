//! Host locking provider
//!
//! Locks live in the `file_locks` table, one row per resource key and owner.
//! The `lock` column holds `-1` for an exclusive lock and the number of
//! shared holds the owner has on the key. The state of a resource is the sum
//! over all of its owners.

use crate::db::Database;
use crate::error::{FixtureError, Result};
use camino::Utf8PathBuf;
use rusqlite::{Connection, params};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

const EXCLUSIVE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    File,
    Folder,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::File => "file",
            ResourceType::Folder => "folder",
        }
    }
}

impl FromStr for ResourceType {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" | "files" => Ok(ResourceType::File),
            "folder" | "dir" | "directory" => Ok(ResourceType::Folder),
            other => Err(FixtureError::InvalidInput(format!(
                "unknown resource type '{other}', expected 'file' or 'folder'"
            ))),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    Shared,
    Exclusive,
}

impl FromStr for LockKind {
    type Err = FixtureError;

    /// Accepts the names as well as the host's numeric constants (1 = shared, 2 = exclusive)
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "shared" | "1" => Ok(LockKind::Shared),
            "exclusive" | "2" => Ok(LockKind::Exclusive),
            other => Err(FixtureError::InvalidInput(format!(
                "unknown lock kind '{other}', expected 'shared' or 'exclusive'"
            ))),
        }
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Shared => f.write_str("shared"),
            LockKind::Exclusive => f.write_str("exclusive"),
        }
    }
}

/// Identifier of a lockable resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    key: String,
    resource_type: ResourceType,
}

impl LockKey {
    /// Derive the key for a path in a user's storage.
    ///
    /// Leading and trailing slashes are not significant, so `/a.txt` and
    /// `a.txt` name the same resource.
    pub fn derive(resource_type: ResourceType, user: &str, path: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(user.as_bytes());
        hasher.update(b"::");
        hasher.update(path.trim_matches('/').as_bytes());
        let digest = hasher.finalize();

        Self {
            key: format!("{}/{:x}", resource_type.as_str(), digest),
            resource_type,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }
}

/// Which locks a bulk release applies to
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseScope<'a> {
    /// Only locks on this resource type
    pub resource_type: Option<ResourceType>,
    /// Only locks created by this owner; `None` releases regardless of owner
    pub owner: Option<&'a str>,
}

pub trait LockingProvider: Send + Sync {
    /// With `kind == None` any lock counts
    fn is_locked(&self, key: &LockKey, kind: Option<LockKind>) -> Result<bool>;

    fn acquire(&self, key: &LockKey, kind: LockKind, owner: &str) -> Result<()>;

    /// Convert the lock held on `key` into `target`
    fn change(&self, key: &LockKey, target: LockKind) -> Result<()>;

    /// Drop every hold on `key`
    fn release(&self, key: &LockKey) -> Result<()>;

    /// Returns the number of released resources
    fn release_all(&self, scope: ReleaseScope<'_>) -> Result<usize>;
}

/// Combined holds of every owner on one key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Holds {
    exclusive: bool,
    shared: i64,
}

impl Holds {
    fn load(conn: &Connection, key: &LockKey) -> Result<Self> {
        let mut stmt = conn.prepare("SELECT lock FROM file_locks WHERE key = ?1")?;
        let rows = stmt.query_map(params![key.as_str()], |row| row.get::<_, i64>(0))?;

        let mut holds = Holds::default();
        for lock in rows {
            match lock? {
                EXCLUSIVE => holds.exclusive = true,
                count => holds.shared += count.max(0),
            }
        }
        Ok(holds)
    }

    fn is_free(self) -> bool {
        !self.exclusive && self.shared == 0
    }
}

#[derive(Debug, Clone)]
pub struct DbLockingProvider {
    db_path: Utf8PathBuf,
}

impl DbLockingProvider {
    pub fn new(db_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }
}

impl LockingProvider for DbLockingProvider {
    fn is_locked(&self, key: &LockKey, kind: Option<LockKind>) -> Result<bool> {
        let db = Database::open(&self.db_path)?;
        let holds = Holds::load(db.conn(), key)?;

        Ok(match kind {
            None => !holds.is_free(),
            Some(LockKind::Shared) => holds.shared > 0,
            Some(LockKind::Exclusive) => holds.exclusive,
        })
    }

    fn acquire(&self, key: &LockKey, kind: LockKind, owner: &str) -> Result<()> {
        let mut db = Database::open(&self.db_path)?;
        let tx = db.conn_mut().transaction()?;
        let holds = Holds::load(&tx, key)?;

        match kind {
            LockKind::Shared if holds.exclusive => {
                return Err(FixtureError::Locked(format!(
                    "{} is already exclusively locked",
                    key.as_str()
                )));
            }
            LockKind::Exclusive if !holds.is_free() => {
                return Err(FixtureError::Locked(format!(
                    "{} is already locked",
                    key.as_str()
                )));
            }
            LockKind::Shared => {
                tx.execute(
                    "INSERT INTO file_locks (key, owner, lock, resource_type) VALUES (?1, ?2, 1, ?3)
                     ON CONFLICT(key, owner) DO UPDATE SET lock = lock + 1",
                    params![key.as_str(), owner, key.resource_type().as_str()],
                )?;
            }
            LockKind::Exclusive => {
                tx.execute(
                    "INSERT INTO file_locks (key, owner, lock, resource_type) VALUES (?1, ?2, ?3, ?4)",
                    params![key.as_str(), owner, EXCLUSIVE, key.resource_type().as_str()],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn change(&self, key: &LockKey, target: LockKind) -> Result<()> {
        let mut db = Database::open(&self.db_path)?;
        let tx = db.conn_mut().transaction()?;
        let holds = Holds::load(&tx, key)?;

        // The single remaining row is the one converted
        let (from, to) = match (target, holds) {
            (_, holds) if holds.is_free() => {
                return Err(FixtureError::NotFound(format!(
                    "no lock held on {}",
                    key.as_str()
                )));
            }
            (LockKind::Exclusive, Holds { exclusive: false, shared: 1 }) => (1, EXCLUSIVE),
            (LockKind::Shared, Holds { exclusive: true, .. }) => (EXCLUSIVE, 1),
            (LockKind::Exclusive, Holds { exclusive: true, .. }) | (LockKind::Shared, _) => {
                return Err(FixtureError::InvalidInput(format!(
                    "{} already holds a {target} lock",
                    key.as_str()
                )));
            }
            (LockKind::Exclusive, _) => {
                return Err(FixtureError::Locked(format!(
                    "{} has more than one shared holder",
                    key.as_str()
                )));
            }
        };

        tx.execute(
            "UPDATE file_locks SET lock = ?3 WHERE key = ?1 AND lock = ?2",
            params![key.as_str(), from, to],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn release(&self, key: &LockKey) -> Result<()> {
        let db = Database::open(&self.db_path)?;
        let removed = db.conn().execute(
            "DELETE FROM file_locks WHERE key = ?1",
            params![key.as_str()],
        )?;

        if removed == 0 {
            return Err(FixtureError::NotFound(format!(
                "no lock held on {}",
                key.as_str()
            )));
        }
        Ok(())
    }

    /// With an owner only that owner's holds go; other owners keep theirs
    fn release_all(&self, scope: ReleaseScope<'_>) -> Result<usize> {
        let mut db = Database::open(&self.db_path)?;
        let tx = db.conn_mut().transaction()?;
        let resource_type = scope.resource_type.map(ResourceType::as_str);

        let released: i64 = tx.query_row(
            "SELECT COUNT(DISTINCT key) FROM file_locks
             WHERE (?1 IS NULL OR resource_type = ?1)
               AND (?2 IS NULL OR owner = ?2)",
            params![resource_type, scope.owner],
            |row| row.get(0),
        )?;
        tx.execute(
            "DELETE FROM file_locks
             WHERE (?1 IS NULL OR resource_type = ?1)
               AND (?2 IS NULL OR owner = ?2)",
            params![resource_type, scope.owner],
        )?;
        tx.commit()?;

        Ok(usize::try_from(released).unwrap_or(0))
    }
}

/// Provider used when the host runs with locking disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLockingProvider;

impl LockingProvider for NoopLockingProvider {
    fn is_locked(&self, _key: &LockKey, _kind: Option<LockKind>) -> Result<bool> {
        Ok(false)
    }

    fn acquire(&self, _key: &LockKey, _kind: LockKind, _owner: &str) -> Result<()> {
        Ok(())
    }

    fn change(&self, _key: &LockKey, _target: LockKind) -> Result<()> {
        Ok(())
    }

    fn release(&self, _key: &LockKey) -> Result<()> {
        Ok(())
    }

    fn release_all(&self, _scope: ReleaseScope<'_>) -> Result<usize> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> (tempfile::TempDir, DbLockingProvider) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(dir.path().join("host.db")).unwrap();
        (dir, DbLockingProvider::new(path))
    }

    #[test]
    fn test_key_ignores_surrounding_slashes() {
        let a = LockKey::derive(ResourceType::File, "alice", "/a.txt");
        let b = LockKey::derive(ResourceType::File, "alice", "a.txt");
        let c = LockKey::derive(ResourceType::File, "bob", "a.txt");
        let d = LockKey::derive(ResourceType::Folder, "alice", "a.txt");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert!(a.as_str().starts_with("file/"));

        let keys: std::collections::HashSet<LockKey> = [a, b, c, d].into_iter().collect();
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_kind_parsing_accepts_numeric_constants() {
        assert_eq!("1".parse::<LockKind>().unwrap(), LockKind::Shared);
        assert_eq!("EXCLUSIVE".parse::<LockKind>().unwrap(), LockKind::Exclusive);
        assert!("3".parse::<LockKind>().is_err());
    }

    #[test]
    fn test_shared_locks_stack() {
        let (_dir, provider) = provider();
        let key = LockKey::derive(ResourceType::File, "alice", "a.txt");

        provider.acquire(&key, LockKind::Shared, "fixtured").unwrap();
        provider.acquire(&key, LockKind::Shared, "fixtured").unwrap();

        assert!(provider.is_locked(&key, Some(LockKind::Shared)).unwrap());
        assert!(!provider.is_locked(&key, Some(LockKind::Exclusive)).unwrap());
        assert!(matches!(
            provider.acquire(&key, LockKind::Exclusive, "fixtured"),
            Err(FixtureError::Locked(_))
        ));
        // Two holders cannot be upgraded
        assert!(matches!(
            provider.change(&key, LockKind::Exclusive),
            Err(FixtureError::Locked(_))
        ));
    }

    #[test]
    fn test_exclusive_blocks_everything() {
        let (_dir, provider) = provider();
        let key = LockKey::derive(ResourceType::File, "alice", "a.txt");

        provider.acquire(&key, LockKind::Exclusive, "fixtured").unwrap();
        assert!(matches!(
            provider.acquire(&key, LockKind::Shared, "fixtured"),
            Err(FixtureError::Locked(_))
        ));
        assert!(matches!(
            provider.acquire(&key, LockKind::Exclusive, "fixtured"),
            Err(FixtureError::Locked(_))
        ));
    }

    #[test]
    fn test_change_round_trip() {
        let (_dir, provider) = provider();
        let key = LockKey::derive(ResourceType::Folder, "alice", "docs");

        provider.acquire(&key, LockKind::Shared, "fixtured").unwrap();
        provider.change(&key, LockKind::Exclusive).unwrap();
        assert!(provider.is_locked(&key, Some(LockKind::Exclusive)).unwrap());

        provider.change(&key, LockKind::Shared).unwrap();
        assert!(provider.is_locked(&key, Some(LockKind::Shared)).unwrap());
    }

    #[test]
    fn test_change_without_lock_is_not_found() {
        let (_dir, provider) = provider();
        let key = LockKey::derive(ResourceType::File, "alice", "nothing");

        assert!(matches!(
            provider.change(&key, LockKind::Exclusive),
            Err(FixtureError::NotFound(_))
        ));
    }

    #[test]
    fn test_release() {
        let (_dir, provider) = provider();
        let key = LockKey::derive(ResourceType::File, "alice", "a.txt");

        provider.acquire(&key, LockKind::Exclusive, "fixtured").unwrap();
        provider.release(&key).unwrap();
        assert!(!provider.is_locked(&key, None).unwrap());
        assert!(matches!(provider.release(&key), Err(FixtureError::NotFound(_))));
    }

    #[test]
    fn test_release_all_respects_owner_and_type() {
        let (_dir, provider) = provider();
        let ours_file = LockKey::derive(ResourceType::File, "alice", "a.txt");
        let ours_folder = LockKey::derive(ResourceType::Folder, "alice", "docs");
        let foreign = LockKey::derive(ResourceType::File, "bob", "b.txt");

        provider.acquire(&ours_file, LockKind::Shared, "fixtured").unwrap();
        provider.acquire(&ours_folder, LockKind::Shared, "fixtured").unwrap();
        provider.acquire(&foreign, LockKind::Exclusive, "webdav").unwrap();

        let released = provider
            .release_all(ReleaseScope {
                resource_type: Some(ResourceType::File),
                owner: Some("fixtured"),
            })
            .unwrap();
        assert_eq!(released, 1);
        assert!(provider.is_locked(&ours_folder, None).unwrap());
        assert!(provider.is_locked(&foreign, None).unwrap());

        let released = provider
            .release_all(ReleaseScope {
                resource_type: None,
                owner: Some("fixtured"),
            })
            .unwrap();
        assert_eq!(released, 1);
        assert!(provider.is_locked(&foreign, None).unwrap());

        let released = provider.release_all(ReleaseScope::default()).unwrap();
        assert_eq!(released, 1);
        assert!(!provider.is_locked(&foreign, None).unwrap());
    }

    #[test]
    fn test_owner_scoped_release_keeps_other_holders() {
        let (_dir, provider) = provider();
        let ours = ReleaseScope {
            resource_type: None,
            owner: Some("fixtured"),
        };

        // Our hold first, then a foreign one on the same resource
        let first = LockKey::derive(ResourceType::File, "alice", "shared-1.txt");
        provider.acquire(&first, LockKind::Shared, "fixtured").unwrap();
        provider.acquire(&first, LockKind::Shared, "webdav").unwrap();

        // Foreign hold first, then ours
        let second = LockKey::derive(ResourceType::File, "alice", "shared-2.txt");
        provider.acquire(&second, LockKind::Shared, "webdav").unwrap();
        provider.acquire(&second, LockKind::Shared, "fixtured").unwrap();

        assert_eq!(provider.release_all(ours).unwrap(), 2);

        for key in [&first, &second] {
            assert!(provider.is_locked(key, Some(LockKind::Shared)).unwrap());
            // Exactly one holder is left, so it can be upgraded
            provider.change(key, LockKind::Exclusive).unwrap();
        }
        assert_eq!(provider.release_all(ours).unwrap(), 0);
    }

    #[test]
    fn test_holds_add_up_across_owners() {
        let (_dir, provider) = provider();
        let key = LockKey::derive(ResourceType::Folder, "alice", "docs");

        provider.acquire(&key, LockKind::Shared, "fixtured").unwrap();
        provider.acquire(&key, LockKind::Shared, "webdav").unwrap();

        assert!(matches!(
            provider.change(&key, LockKind::Exclusive),
            Err(FixtureError::Locked(_))
        ));
        assert!(matches!(
            provider.acquire(&key, LockKind::Exclusive, "webdav"),
            Err(FixtureError::Locked(_))
        ));

        assert_eq!(provider.release_all(ReleaseScope::default()).unwrap(), 1);
        assert!(!provider.is_locked(&key, None).unwrap());
    }

    #[test]
    fn test_noop_provider_never_locks() {
        let provider = NoopLockingProvider;
        let key = LockKey::derive(ResourceType::File, "alice", "a.txt");

        provider.acquire(&key, LockKind::Exclusive, "fixtured").unwrap();
        assert!(!provider.is_locked(&key, None).unwrap());
        provider.release(&key).unwrap();
    }
}
