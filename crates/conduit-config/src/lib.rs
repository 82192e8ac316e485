#![allow(clippy::must_use_candidate)]

//! Configuration for conduit
//!
//! Validates the host-supplied credential map used by every adapter call and
//! loads the TOML config file used by the command-line tool.

pub mod credentials;
mod env;
mod loader;
pub mod provider;
pub mod telemetry;

use indexmap::IndexMap;
use serde::Deserialize;

pub use credentials::{
    CredentialMap, Credentials, CredentialsError, DEFAULT_CONTEXT_SIZE, DEFAULT_ENDPOINT_URL, DEFAULT_MAX_TOKENS,
};
pub use provider::ProviderProfile;
pub use telemetry::{LogFormat, TelemetryConfig};

/// Top-level conduit configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Upstream profiles keyed by name, in file order
    #[serde(default)]
    pub providers: IndexMap<String, ProviderProfile>,
}
