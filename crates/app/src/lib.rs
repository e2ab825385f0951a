//! `splitbook-app`: application entry point for the presentation layer.
//!
//! **Responsibility:** wire configuration, logging and storage together and
//! expose the split/share use cases as one service. No ambient globals: the
//! configuration is passed in and every collaborator is threaded through
//! [`SplitApp`].

pub mod config;
pub mod errors;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use errors::{AppError, AppResult};
pub use service::SplitApp;
