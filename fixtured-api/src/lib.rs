pub mod auth;
pub mod error;
pub mod handlers;
pub mod params;
pub mod parser;
pub mod response;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use response::Envelope;
pub use server::{FixtureServer, build_router};
pub use state::AppState;
