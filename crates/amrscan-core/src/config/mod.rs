//! Configuration for discovery runs
//!
//! Credentials and tuning knobs come from an optional TOML file, the
//! environment, and command-line overrides, and are resolved once into a
//! [`Settings`] value.
//!
//! # Features
//!
//! - Standard Azure SDK environment variables (`AZURE_CLIENT_ID`, ...)
//! - Environment variable expansion in config files
//! - Platform-specific config file locations

#![allow(clippy::module_inception)]

pub mod config;
pub mod error;
pub mod settings;

// Re-export main types for convenience
pub use config::Config;
pub use error::{ConfigError, Result};
pub use settings::{Overrides, Settings, parse_subscription_filter};
