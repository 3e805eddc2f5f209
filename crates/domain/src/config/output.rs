use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rendered documents
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Where and how the two downstream configuration documents are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "d_config_dir")]
    pub config_dir: PathBuf,
    /// Defaults to `{config_dir}/backups`.
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
    /// File name of the routing-service document.
    #[serde(default = "d_routing_file")]
    pub routing_file: String,
    /// File name of the unified-service document.
    #[serde(default = "d_unified_file")]
    pub unified_file: String,
    /// Base URL the unified service uses to reach the routing service.
    #[serde(default = "d_gateway_root")]
    pub gateway_root: String,
    #[serde(default)]
    pub unified_api: UnifiedApiConfig,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            config_dir: d_config_dir(),
            backup_dir: None,
            routing_file: d_routing_file(),
            unified_file: d_unified_file(),
            gateway_root: d_gateway_root(),
            unified_api: UnifiedApiConfig::default(),
        }
    }
}

impl OutputConfig {
    pub fn backup_dir(&self) -> PathBuf {
        self.backup_dir
            .clone()
            .unwrap_or_else(|| self.config_dir.join("backups"))
    }

    pub fn routing_path(&self) -> PathBuf {
        self.config_dir.join(&self.routing_file)
    }

    pub fn unified_path(&self) -> PathBuf {
        self.config_dir.join(&self.unified_file)
    }
}

/// The `api` section of the unified-service document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedApiConfig {
    #[serde(default = "d_8000")]
    pub port: u16,
    #[serde(default = "d_bind")]
    pub bind: String,
}

impl Default for UnifiedApiConfig {
    fn default() -> Self {
        Self {
            port: d_8000(),
            bind: d_bind(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Downstream services (apply probes)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamConfig {
    #[serde(default = "d_routing_url")]
    pub routing_url: String,
    #[serde(default = "d_unified_url")]
    pub unified_url: String,
    #[serde(default = "d_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            routing_url: d_routing_url(),
            unified_url: d_unified_url(),
            probe_timeout_secs: d_probe_timeout(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_config_dir() -> PathBuf {
    PathBuf::from("./config")
}
fn d_routing_file() -> String {
    "gpt-load.yaml".into()
}
fn d_unified_file() -> String {
    "api.yaml".into()
}
fn d_gateway_root() -> String {
    "http://localhost:3001".into()
}
fn d_8000() -> u16 {
    8000
}
fn d_bind() -> String {
    "0.0.0.0".into()
}
fn d_routing_url() -> String {
    "http://localhost:3001".into()
}
fn d_unified_url() -> String {
    "http://localhost:8000".into()
}
fn d_probe_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_dir_defaults_under_config_dir() {
        let cfg = OutputConfig {
            config_dir: PathBuf::from("/etc/uniload"),
            ..Default::default()
        };
        assert_eq!(cfg.backup_dir(), PathBuf::from("/etc/uniload/backups"));
        assert_eq!(cfg.routing_path(), PathBuf::from("/etc/uniload/gpt-load.yaml"));
        assert_eq!(cfg.unified_path(), PathBuf::from("/etc/uniload/api.yaml"));
    }

    #[test]
    fn explicit_backup_dir_wins() {
        let toml_str = r#"
            config_dir = "out"
            backup_dir = "/var/backups/uniload"
        "#;
        let cfg: OutputConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.backup_dir(), PathBuf::from("/var/backups/uniload"));
    }

    #[test]
    fn unified_api_defaults() {
        let cfg: OutputConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.unified_api.port, 8000);
        assert_eq!(cfg.unified_api.bind, "0.0.0.0");
        assert_eq!(cfg.gateway_root, "http://localhost:3001");
    }
}
