mod discovery;
mod normalization;
mod observability;
mod output;
mod server;
mod store;

pub use discovery::*;
pub use normalization::*;
pub use observability::*;
pub use output::*;
pub use server::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Application configuration, loaded once at startup and handed to each
/// component's constructor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub downstream: DownstreamConfig,
    #[serde(default)]
    pub normalization: NormalizationConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl ConfigError {
    fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }

        if self.discovery.max_concurrent == 0 {
            errors.push(ConfigError::error(
                "discovery.max_concurrent",
                "must be at least 1",
            ));
        }
        if self.discovery.backoff_factor < 1.0 {
            errors.push(ConfigError::warning(
                "discovery.backoff_factor",
                "factor below 1.0 shrinks the wait between retries",
            ));
        }
        if self.discovery.timeout_secs == 0 {
            errors.push(ConfigError::error(
                "discovery.timeout_secs",
                "must be greater than 0",
            ));
        }

        if self.health.max_concurrent == 0 {
            errors.push(ConfigError::error("health.max_concurrent", "must be at least 1"));
        }
        if self.health.timeout_secs == 0 {
            errors.push(ConfigError::error("health.timeout_secs", "must be greater than 0"));
        }
        if self.health.enabled && self.health.interval_secs == 0 {
            errors.push(ConfigError::error(
                "health.interval_secs",
                "must be greater than 0 when the health loop is enabled",
            ));
        }

        if self.output.routing_file.is_empty() {
            errors.push(ConfigError::error("output.routing_file", "must not be empty"));
        }
        if self.output.unified_file.is_empty() {
            errors.push(ConfigError::error("output.unified_file", "must not be empty"));
        }
        if self.output.routing_file == self.output.unified_file {
            errors.push(ConfigError::error(
                "output.unified_file",
                "must differ from output.routing_file",
            ));
        }
        if self.output.gateway_root.is_empty() {
            errors.push(ConfigError::error("output.gateway_root", "must not be empty"));
        }

        if let Err(e) = crate::canonical::Canonicalizer::from_rules(&self.normalization.rules) {
            errors.push(ConfigError::error("normalization.rules", e.to_string()));
        }
        if self.normalization.rules.is_empty() {
            errors.push(ConfigError::warning(
                "normalization.rules",
                "no suffix rules: only prefix, case and separator normalization apply",
            ));
        }

        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError::warning(
                "server.cors.allowed_origins",
                "wildcard \"*\" allows all origins (not recommended for production)",
            ));
        }

        errors
    }
}
