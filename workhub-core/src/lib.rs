//! workhub-core: data model, persistence, and ambient plumbing for the
//! workhub collaboration backend
//!
//! The service layer lives in the `workhub-api` crate; this crate holds the
//! entities (users, workspaces, channels), the repository contracts and
//! their SQL-backed implementations, and configuration/logging.

pub mod config;
pub mod core_model;
pub mod core_store;
pub mod logging;

pub use config::{Config, ConfigError};
pub use logging::{init_logging, LogLevel};
