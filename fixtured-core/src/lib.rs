#![allow(clippy::cargo_common_metadata)]

pub mod accounts;
pub mod appconfig;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod filecache;
pub mod locking;
pub mod logfile;
pub mod mimetypes;
pub mod notifications;
pub mod probe;
pub mod serverfs;
pub mod trusted_servers;

#[cfg(feature = "test-utils")]
pub mod test_utils;
