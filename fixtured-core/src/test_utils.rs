//! Shared test utilities for the fixtured workspace
//!
//! Only available when the "test-utils" feature is enabled.

use crate::config::{Config, UserConfig};
use camino::Utf8Path;

/// Administrator configured by [`test_config`]
pub const TEST_ADMIN: (&str, &str) = ("admin", "admin");

/// Regular user configured by [`test_config`]
pub const TEST_USER: (&str, &str) = ("alice", "alice-secret");

/// Build a configuration whose host lives entirely below `base`
///
/// Layout created on disk:
///
/// ```text
/// base/server        server root
/// base/fixtures      fixture root
/// base/data          data directory, holds owncloud.log
/// base/config        host config directory
/// base/skeletons     skeleton root
/// base/host.db       host database
/// ```
pub fn test_config(base: &Utf8Path) -> Config {
    let mut config = Config::default();

    let general = &mut config.general;
    general.server_root = base.join("server");
    general.fixture_root = Some(base.join("fixtures"));
    general.data_directory = base.join("data");
    general.log_file = Some(base.join("data/owncloud.log"));
    general.db_file = base.join("host.db");
    general.host_config_dir = Some(base.join("config"));
    general.skeleton_root = Some(base.join("skeletons"));

    for dir in ["server", "fixtures", "data", "config", "skeletons"] {
        std::fs::create_dir_all(base.join(dir)).unwrap_or_else(|e| panic!("create {dir}: {e}"));
    }

    config.users = vec![
        UserConfig {
            name: TEST_ADMIN.0.to_string(),
            password: TEST_ADMIN.1.to_string(),
            admin: true,
        },
        UserConfig {
            name: TEST_USER.0.to_string(),
            password: TEST_USER.1.to_string(),
            admin: false,
        },
    ];

    config
}
