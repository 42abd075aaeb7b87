use crate::error::ApiResult;
use crate::response::Envelope;
use crate::state::AppState;
use axum::extract::State;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SysInfo {
    pub server_root: String,
    pub fixture_root: String,
    pub data_directory: String,
    pub log_file: String,
    pub version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub family: &'static str,
    pub pid: u32,
}

pub async fn read(State(state): State<AppState>) -> ApiResult<Envelope> {
    let general = &state.config.general;
    Envelope::from_serialize(&SysInfo {
        server_root: general.server_root.to_string(),
        fixture_root: state.files.path().to_string(),
        data_directory: general.data_directory.to_string(),
        log_file: state.log.path().to_string(),
        version: env!("CARGO_PKG_VERSION"),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        family: std::env::consts::FAMILY,
        pid: std::process::id(),
    })
}
