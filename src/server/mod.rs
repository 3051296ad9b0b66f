pub mod auth;
mod config;
mod daemon;
mod error;
mod handlers;
mod routes;
pub mod session;
mod state;
pub mod upload;
pub mod validation;
pub mod views;

pub use config::{
  DatabaseSection, LimitsSection, LoggingSection, SeedSection, ServerConfig, ServerSection,
  SessionSection, UploadsSection,
};
pub use daemon::{seed_categories, Daemon};
pub use error::AppError;
pub use routes::build_router;
pub use state::AppState;
