use crate::auth::UserDirectory;
use fixtured_core::accounts::{AccountStore, DbAccountStore};
use fixtured_core::appconfig::{ConfigStore, DbConfigStore};
use fixtured_core::command::{CommandRunner, ProcessRunner};
use fixtured_core::config::Config;
use fixtured_core::error::Result;
use fixtured_core::filecache::{DbFileCache, FileCache};
use fixtured_core::locking::{DbLockingProvider, LockingProvider, NoopLockingProvider};
use fixtured_core::logfile::HostLog;
use fixtured_core::mimetypes::{FileMimeTypeMappings, MimeTypeMappings};
use fixtured_core::notifications::{DbNotificationManager, NotificationManager};
use fixtured_core::probe::{CommandProbe, EnvironmentProbe};
use fixtured_core::serverfs::FixtureRoot;
use fixtured_core::trusted_servers::{DbTrustedServerStore, TrustedServerStore};
use std::sync::Arc;
use tracing::info;

/// System value holding whether the host uses file locking
pub const FILELOCKING_ENABLED: &str = "filelocking.enabled";

/// Shared application state: the host collaborators every handler works on
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<UserDirectory>,
    pub config_store: Arc<dyn ConfigStore>,
    pub locks: Arc<dyn LockingProvider>,
    pub notifications: Arc<dyn NotificationManager>,
    pub accounts: Arc<dyn AccountStore>,
    pub file_cache: Arc<dyn FileCache>,
    pub trusted_servers: Arc<dyn TrustedServerStore>,
    pub mimetypes: Arc<dyn MimeTypeMappings>,
    /// `None` while command execution is disabled
    pub occ: Option<Arc<dyn CommandRunner>>,
    pub probe: Arc<dyn EnvironmentProbe>,
    pub files: FixtureRoot,
    pub log: HostLog,
}

impl AppState {
    /// Wire the host adapters described by `config` and seed the host database
    pub fn from_config(config: Config) -> Result<Self> {
        let db_path = config.general.db_file.clone();

        let config_store = DbConfigStore::new(db_path.clone());
        config_store.set_system_value(FILELOCKING_ENABLED, &config.locking.enabled.to_string())?;

        let accounts = DbAccountStore::new(db_path.clone());
        for user in &config.users {
            accounts.ensure_account(&user.name)?;
        }

        let locks: Arc<dyn LockingProvider> = if config.locking.enabled {
            Arc::new(DbLockingProvider::new(db_path.clone()))
        } else {
            info!("file locking disabled, using the no-op provider");
            Arc::new(NoopLockingProvider)
        };

        let occ = match (&config.occ.program, config.occ.enabled) {
            (Some(program), true) => {
                let working_dir = config
                    .occ
                    .working_dir
                    .clone()
                    .unwrap_or_else(|| config.general.server_root.clone());
                let runner = ProcessRunner::new(program.clone(), config.occ.args.clone())
                    .with_working_dir(working_dir);
                Some(Arc::new(runner) as Arc<dyn CommandRunner>)
            }
            _ => None,
        };

        let probe = CommandProbe::new(
            &config.probes.apache_modules_command,
            &config.probes.opcache_reset_command,
        );

        Ok(Self {
            users: Arc::new(UserDirectory::new(&config.users)),
            config_store: Arc::new(config_store),
            locks,
            notifications: Arc::new(DbNotificationManager::new(db_path.clone())),
            accounts: Arc::new(accounts),
            file_cache: Arc::new(DbFileCache::new(db_path.clone())),
            trusted_servers: Arc::new(DbTrustedServerStore::new(db_path)),
            mimetypes: Arc::new(FileMimeTypeMappings::new(config.general.host_config_dir.clone())),
            occ,
            probe: Arc::new(probe),
            files: FixtureRoot::new(config.fixture_root().clone()),
            log: HostLog::from_config(&config),
            config: Arc::new(config),
        })
    }

    pub fn with_command_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.occ = Some(runner);
        self
    }

    pub fn with_probe(mut self, probe: Arc<dyn EnvironmentProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Owner tag stored with every lock created through the API
    pub fn lock_owner(&self) -> &str {
        &self.config.locking.owner_tag
    }
}
