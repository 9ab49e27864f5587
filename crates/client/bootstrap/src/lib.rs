//! Shared bootstrap utilities for client front-ends.
//!
//! Provides configuration loading, logging setup, and runtime assembly that
//! can be reused by the headless binary or any other front-end crate.
pub mod builder;
pub mod config;
pub mod logging;

pub use builder::{ClientBuilder, ClientSetup};
pub use config::{AppConfig, ConfigError};
pub use logging::setup_logging;
