use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Catalogue discovery
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Settings for fetching model catalogues from providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Maximum catalogue requests in flight at once.
    #[serde(default = "d_5")]
    pub max_concurrent: usize,
    /// Retries after the first attempt on 429 / 5xx / timeout.
    #[serde(default = "d_3")]
    pub max_retries: u32,
    /// Sleep before retry `n` (0-based) is `backoff_factor ^ n` seconds.
    #[serde(default = "d_backoff_factor")]
    pub backoff_factor: f64,
    #[serde(default = "d_30")]
    pub timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_concurrent: d_5(),
            max_retries: d_3(),
            backoff_factor: d_backoff_factor(),
            timeout_secs: d_30(),
        }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Health monitoring
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Run the periodic health loop while serving.
    #[serde(default = "d_true")]
    pub enabled: bool,
    #[serde(default = "d_300")]
    pub interval_secs: u64,
    #[serde(default = "d_30")]
    pub timeout_secs: u64,
    #[serde(default = "d_10")]
    pub max_concurrent: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: d_300(),
            timeout_secs: d_30(),
            max_concurrent: d_10(),
        }
    }
}

impl HealthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn d_true() -> bool {
    true
}
fn d_3() -> u32 {
    3
}
fn d_5() -> usize {
    5
}
fn d_10() -> usize {
    10
}
fn d_30() -> u64 {
    30
}
fn d_300() -> u64 {
    300
}
fn d_backoff_factor() -> f64 {
    2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_defaults() {
        let cfg: DiscoveryConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.max_concurrent, 5);
        assert_eq!(cfg.max_retries, 3);
        assert!((cfg.backoff_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn health_defaults() {
        let cfg: HealthConfig = toml::from_str("").unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.max_concurrent, 10);
        assert_eq!(cfg.interval(), Duration::from_secs(300));
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
    }
}
