use crate::error::{FixtureError, Result};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub general: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub locking: LockingConfig,
    #[serde(default)]
    pub occ: OccConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub probes: ProbeConfig,
    #[serde(default = "default_users")]
    pub users: Vec<UserConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Installation root of the host platform
    pub server_root: Utf8PathBuf,
    /// Root for fixture files and directories; defaults to `server_root`
    pub fixture_root: Option<Utf8PathBuf>,
    #[serde(default = "default_data_directory")]
    pub data_directory: Utf8PathBuf,
    /// Host log file read and cleared by the logfile endpoints
    pub log_file: Option<Utf8PathBuf>,
    #[serde(default = "default_db_file")]
    pub db_file: Utf8PathBuf,
    /// Directory holding the host's `mimetypemapping.json` override
    pub host_config_dir: Option<Utf8PathBuf>,
    /// Directory whose children can be selected as skeleton directory
    pub skeleton_root: Option<Utf8PathBuf>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockingConfig {
    /// Initial value of the `filelocking.enabled` system value
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Owner stored with every lock created through the API
    #[serde(default = "default_owner_tag")]
    pub owner_tag: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OccConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Program started for every command, e.g. `php`
    pub program: Option<String>,
    /// Arguments placed before the command words, e.g. the path to `occ`
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory; defaults to the server root
    pub working_dir: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_notification_app")]
    pub app: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_apache_modules_command")]
    pub apache_modules_command: Vec<String>,
    #[serde(default)]
    pub opcache_reset_command: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub admin: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            base_path: default_base_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            owner_tag: default_owner_tag(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            app: default_notification_app(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            apache_modules_command: default_apache_modules_command(),
            opcache_reset_command: Vec::new(),
        }
    }
}

// Default value functions
fn default_data_directory() -> Utf8PathBuf {
    Utf8PathBuf::from("/var/www/owncloud/data")
}

fn default_db_file() -> Utf8PathBuf {
    dirs::data_dir()
        .map(|p| p.join("fixtured/fixtured.db"))
        .and_then(|p| Utf8PathBuf::try_from(p).ok())
        .unwrap_or_else(|| Utf8PathBuf::from("~/.local/share/fixtured/fixtured.db"))
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8380
}

fn default_base_path() -> String {
    "/apps/testing/api/v1".to_owned()
}

const fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

fn default_owner_tag() -> String {
    "fixtured".to_owned()
}

fn default_notification_app() -> String {
    "notificationsacceptancetesting".to_owned()
}

fn default_apache_modules_command() -> Vec<String> {
    vec!["apachectl".to_owned(), "-M".to_owned()]
}

fn default_users() -> Vec<UserConfig> {
    vec![UserConfig {
        name: "admin".to_owned(),
        password: "admin".to_owned(),
        admin: true,
    }]
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| FixtureError::Config(format!("Failed to read config: {e}")))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| FixtureError::Config(format!("Failed to parse config: {e}")))?;

        config.expand_paths();
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|_| Self::default())
    }

    /// Directory fixture files are created under
    pub fn fixture_root(&self) -> &Utf8PathBuf {
        self.general
            .fixture_root
            .as_ref()
            .unwrap_or(&self.general.server_root)
    }

    fn find_config_file() -> Result<PathBuf> {
        let candidates = [
            dirs::config_dir().map(|p| p.join("fixtured/fixtured.toml")),
            Some(PathBuf::from("/etc/fixtured/fixtured.toml")),
        ];

        for candidate in candidates.into_iter().flatten() {
            if candidate.exists() {
                return Ok(candidate);
            }
        }

        Err(FixtureError::Config("Config file not found".to_owned()))
    }

    fn expand_paths(&mut self) {
        fn expand_tilde(path: &Utf8PathBuf) -> Utf8PathBuf {
            let path_str = path.as_str();
            if path_str.starts_with("~/") {
                if let Some(home) = dirs::home_dir() {
                    if let Some(home_str) = home.to_str() {
                        return Utf8PathBuf::from(path_str.replacen('~', home_str, 1));
                    }
                }
            }
            path.clone()
        }

        let general = &mut self.general;
        general.server_root = expand_tilde(&general.server_root);
        general.data_directory = expand_tilde(&general.data_directory);
        general.db_file = expand_tilde(&general.db_file);
        for path in [
            &mut general.fixture_root,
            &mut general.log_file,
            &mut general.host_config_dir,
            &mut general.skeleton_root,
        ]
        .into_iter()
        .flatten()
        {
            *path = expand_tilde(path);
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.fixture_root().exists() {
            return Err(FixtureError::Config(format!(
                "Fixture root not found: {}",
                self.fixture_root()
            )));
        }
        if !self.network.base_path.starts_with('/') {
            return Err(FixtureError::Config(format!(
                "Base path must start with '/': {}",
                self.network.base_path
            )));
        }
        if self.occ.enabled && self.occ.program.is_none() {
            return Err(FixtureError::Config(
                "occ.enabled requires occ.program".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                server_root: Utf8PathBuf::from("/var/www/owncloud"),
                fixture_root: None,
                data_directory: default_data_directory(),
                log_file: None,
                db_file: default_db_file(),
                host_config_dir: None,
                skeleton_root: None,
                log_level: default_log_level(),
            },
            network: NetworkConfig::default(),
            locking: LockingConfig::default(),
            occ: OccConfig::default(),
            notifications: NotificationsConfig::default(),
            probes: ProbeConfig::default(),
            users: default_users(),
        }
    }
}
