use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource is locked: {0}")]
    Locked(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Command error: {0}")]
    Command(String),
}

impl From<rusqlite::Error> for FixtureError {
    fn from(err: rusqlite::Error) -> Self {
        FixtureError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for FixtureError {
    fn from(err: serde_json::Error) -> Self {
        FixtureError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FixtureError>;
