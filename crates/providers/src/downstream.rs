//! Reachability probes for the two downstream gateways.
//!
//! Neither gateway hot-reloads its configuration, so a successful probe only
//! means the freshly written files will be picked up on the next restart.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use ul_domain::config::DownstreamConfig;

use crate::transport::CatalogueTransport;

pub const RESTART_HINT: &str =
    "configuration files updated; restart the routing and unified services to load them";

#[derive(Debug, Clone, Serialize)]
pub struct ServiceProbe {
    pub url: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    pub routing: ServiceProbe,
    pub unified: ServiceProbe,
    pub requires_restart: bool,
    pub message: String,
}

pub struct DownstreamProbe {
    transport: Arc<dyn CatalogueTransport>,
    routing_url: String,
    unified_url: String,
    timeout: Duration,
}

impl DownstreamProbe {
    pub fn new(transport: Arc<dyn CatalogueTransport>, cfg: &DownstreamConfig) -> Self {
        Self {
            transport,
            routing_url: cfg.routing_url.trim_end_matches('/').to_string(),
            unified_url: cfg.unified_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(cfg.probe_timeout_secs),
        }
    }

    /// Probe both services and report whether a restart will apply the new
    /// configuration.
    pub async fn apply(&self) -> ApplyReport {
        let (routing, unified) = tokio::join!(self.probe_routing(), self.probe_unified());

        let message = if routing.success || unified.success {
            RESTART_HINT.to_string()
        } else {
            "no downstream service reachable; check that they are running".to_string()
        };
        tracing::info!(
            routing = routing.success,
            unified = unified.success,
            "downstream probe finished"
        );

        ApplyReport {
            routing,
            unified,
            requires_restart: true,
            message,
        }
    }

    async fn probe_routing(&self) -> ServiceProbe {
        let url = format!("{}/health", self.routing_url);
        match self.transport.get(&url, None, self.timeout).await {
            Ok(resp) if resp.status == 200 => self.ok(&self.routing_url, "routing service is up"),
            Ok(resp) => self.failed(
                &self.routing_url,
                format!("routing service answered HTTP {}", resp.status),
            ),
            Err(e) => self.failed(
                &self.routing_url,
                format!("routing service unreachable: {e}"),
            ),
        }
    }

    /// The unified service may lack `/health`; when that request fails at
    /// the transport level the root path is tried, where 200 or 404 both
    /// mean the process is listening.
    async fn probe_unified(&self) -> ServiceProbe {
        let health_url = format!("{}/health", self.unified_url);
        let reachable = match self.transport.get(&health_url, None, self.timeout).await {
            Ok(resp) => Ok((resp.status == 200, resp.status)),
            Err(_) => {
                let root_url = format!("{}/", self.unified_url);
                self.transport
                    .get(&root_url, None, self.timeout)
                    .await
                    .map(|resp| (matches!(resp.status, 200 | 404), resp.status))
            }
        };

        match reachable {
            Ok((true, _)) => self.ok(&self.unified_url, "unified service is up"),
            Ok((false, status)) => self.failed(
                &self.unified_url,
                format!("unified service answered HTTP {status}"),
            ),
            Err(e) => self.failed(
                &self.unified_url,
                format!("unified service unreachable: {e}"),
            ),
        }
    }

    fn ok(&self, url: &str, message: &str) -> ServiceProbe {
        ServiceProbe {
            url: url.to_string(),
            success: true,
            message: message.to_string(),
        }
    }

    fn failed(&self, url: &str, message: String) -> ServiceProbe {
        tracing::warn!(%url, %message, "downstream probe failed");
        ServiceProbe {
            url: url.to_string(),
            success: false,
            message,
        }
    }
}
