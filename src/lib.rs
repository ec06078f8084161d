//! Folio Client Core
//!
//! Layered architecture:
//! - domain: Core entities, pending operations and errors
//! - hierarchy: Tree building, lookups and drag-and-drop move planning
//! - store: In-memory client state with change notifications
//! - api: REST client for the backend
//! - sync: Parallel dispatch, offline queue and debounce
//! - repository: Durable local storage (SQLite)
//! - commands: The operations a UI calls

pub mod api;
pub mod commands;
pub mod config;
pub mod domain;
pub mod hierarchy;
pub mod repository;
pub mod search;
pub mod store;
pub mod sync;

pub use commands::{CommandError, CommandResult, NewItem, Organizer};
pub use config::{load_config, AppConfig};

pub const APP_NAME: &str = "Folio";

/// Route `log` output to rotating files under the configured log directory
/// and to stderr. Call once at startup.
pub fn init_logging(config: &AppConfig) -> Result<(), rolling_logger::LoggerError> {
    rolling_logger::init_logger(config.log_dir(), APP_NAME)?;
    log::info!("Logging to {}", config.log_dir().display());
    Ok(())
}
