//! HTTP handlers organized by fixture category
//!
//! Every handler binds its parameters, calls one host collaborator from
//! [`AppState`](crate::state::AppState) and wraps the outcome in an
//! [`Envelope`](crate::response::Envelope).

pub mod apache_modules;
pub mod bigfileid;
pub mod config;
pub mod dav_slowdown;
pub mod files_properties;
pub mod lastlogin;
pub mod locking;
pub mod logfile;
pub mod mimetype;
pub mod notifications;
pub mod occ;
pub mod opcache;
pub mod server_files;
pub mod skeleton;
pub mod sysinfo;
pub mod trusted_servers;
pub mod utils;
