//! Configuration for ycprov
//!
//! Settings are read from a TOML file with environment variable expansion,
//! falling back to built-in defaults when the file does not exist.
//!
//! # Features
//!
//! - IAM token resolution (environment first, then config file, optional keyring)
//! - Polling cadence, retry ceiling and concurrency limits
//! - Overridable control-plane endpoints
//! - Provisioning defaults (zones, CIDR blocks, database preset)

// Nested config module is intentional
#![allow(clippy::module_inception)]

pub mod config;
pub mod credential;
pub mod error;
pub mod polling;

// Re-export main types for convenience
pub use config::{Config, Endpoints, ProvisioningConfig};
pub use credential::{IAM_TOKEN_ENV, resolve_credential};
pub use error::{ConfigError, Result};
pub use polling::PollingConfig;
