//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! programmatic setters (ConfigStore)
//!     → copy-on-write update of LoggingConfig
//!     → atomic swap of Arc<LoggingConfig>
//!     → every request/response reads a fresh snapshot
//!
//! settings file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (resolve names, fall back with warnings)
//!     → ConfigStore::apply_settings (toggles only, one swap)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new settings
//!     → store.rs publishes them
//! ```
//!
//! # Design Decisions
//! - Config is never cached by clients; each call reads the current snapshot
//! - Hooks, obscurers and the correlation id provider are code, not settings
//! - All settings fields have defaults to allow minimal files

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{load_settings, ConfigError};
pub use schema::{
    correlation_id_provider, CorrelationIdProvider, LoggingConfig, LoggingSettings,
    ResponseSourcePolicy,
};
pub use store::ConfigStore;
pub use watcher::ConfigWatcher;
