pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod secret;
pub mod session;
pub mod sources;
pub mod store;
pub mod ui;

pub use error::AppError;
pub use session::SessionResolver;
pub use sources::VersionSourceRegistry;
pub use store::ConfigStore;
