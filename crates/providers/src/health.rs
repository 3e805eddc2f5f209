//! Provider liveness checks.
//!
//! A probe asks the provider for its model list. Every probe of a known
//! provider appends exactly one [`HealthCheckRecord`]; probing never raises
//! past the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use ul_domain::config::HealthConfig;
use ul_domain::error::Result;
use ul_domain::records::{HealthCheckRecord, HealthStatus, Provider};
use ul_store::{HealthRepository, ProviderRepository};

use crate::pool::fan_out;
use crate::transport::{CatalogueTransport, TransportError};
use crate::util::models_url;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Result types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize)]
pub struct HealthOutcome {
    pub provider_id: String,
    pub status: HealthStatus,
    pub response_time_ms: Option<u64>,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthOutcome {
    fn without_probe(provider_id: &str, status: HealthStatus, error: String) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            status,
            response_time_ms: None,
            error: Some(error),
            checked_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub timeout: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthBatch {
    pub results: Vec<HealthOutcome>,
    pub summary: HealthSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailingProvider {
    pub provider_id: String,
    pub status: HealthStatus,
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatistics {
    pub total_providers: usize,
    pub enabled_providers: usize,
    /// Latest record is `healthy`.
    pub online: usize,
    /// Latest record is `unhealthy` or `timeout`.
    pub offline: usize,
    /// Mean over latest records that carry a response time; 0 when none do.
    pub average_response_time_ms: u64,
    pub last_check: Option<DateTime<Utc>>,
    pub failing: Vec<FailingProvider>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Monitor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct HealthMonitor {
    providers: Arc<dyn ProviderRepository>,
    records: Arc<dyn HealthRepository>,
    transport: Arc<dyn CatalogueTransport>,
    timeout: Duration,
    max_concurrent: usize,
}

impl HealthMonitor {
    pub fn new(
        providers: Arc<dyn ProviderRepository>,
        records: Arc<dyn HealthRepository>,
        transport: Arc<dyn CatalogueTransport>,
        cfg: &HealthConfig,
    ) -> Self {
        Self {
            providers,
            records,
            transport,
            timeout: cfg.timeout(),
            max_concurrent: cfg.max_concurrent,
        }
    }

    /// Probe one provider by id. Unknown ids yield `not_found` without any
    /// request; store failures yield `error`.
    pub async fn check_provider(&self, provider_id: &str) -> HealthOutcome {
        match self.providers.get_provider(provider_id).await {
            Ok(Some(provider)) => self.probe_and_record(&provider).await,
            Ok(None) => {
                tracing::warn!(provider_id, "health check for unknown provider");
                HealthOutcome::without_probe(
                    provider_id,
                    HealthStatus::NotFound,
                    "provider not found".into(),
                )
            }
            Err(e) => {
                tracing::error!(provider_id, error = %e, "provider lookup failed");
                HealthOutcome::without_probe(provider_id, HealthStatus::Error, e.to_string())
            }
        }
    }

    /// Probe every enabled provider.
    pub async fn check_all(&self) -> Result<HealthBatch> {
        let providers = self.providers.list_providers(true).await?;
        if providers.is_empty() {
            tracing::warn!("no enabled providers to check");
        }

        let results = fan_out(providers, self.max_concurrent, |provider| async move {
            self.probe_and_record(&provider).await
        })
        .await;

        let mut summary = HealthSummary {
            total: results.len(),
            ..Default::default()
        };
        for r in &results {
            match r.status {
                HealthStatus::Healthy => summary.healthy += 1,
                HealthStatus::Unhealthy => summary.unhealthy += 1,
                HealthStatus::Timeout => summary.timeout += 1,
                HealthStatus::Error | HealthStatus::NotFound => {}
            }
        }
        tracing::info!(
            total = summary.total,
            healthy = summary.healthy,
            unhealthy = summary.unhealthy,
            timeout = summary.timeout,
            "health check finished"
        );
        Ok(HealthBatch { results, summary })
    }

    pub async fn statistics(&self) -> Result<HealthStatistics> {
        let all = self.providers.list_providers(false).await?;
        let latest = self.records.latest_health().await?;

        let online = latest
            .iter()
            .filter(|r| r.status == HealthStatus::Healthy)
            .count();
        let failing: Vec<FailingProvider> = latest
            .iter()
            .filter(|r| r.status.is_failing())
            .map(|r| FailingProvider {
                provider_id: r.provider_id.clone(),
                status: r.status,
                error: r.error.clone(),
                checked_at: r.checked_at,
            })
            .collect();
        let times: Vec<u64> = latest.iter().filter_map(|r| r.response_time_ms).collect();
        let average_response_time_ms = if times.is_empty() {
            0
        } else {
            times.iter().sum::<u64>() / times.len() as u64
        };

        Ok(HealthStatistics {
            total_providers: all.len(),
            enabled_providers: all.iter().filter(|p| p.enabled).count(),
            online,
            offline: failing.len(),
            average_response_time_ms,
            last_check: latest.iter().map(|r| r.checked_at).max(),
            failing,
        })
    }

    /// Newest-first probe history of one provider.
    pub async fn history(&self, provider_id: &str, limit: usize) -> Result<Vec<HealthCheckRecord>> {
        self.records.health_history(provider_id, limit).await
    }

    async fn probe_and_record(&self, provider: &Provider) -> HealthOutcome {
        let record = self.probe(provider).await;
        let outcome = HealthOutcome {
            provider_id: record.provider_id.clone(),
            status: record.status,
            response_time_ms: record.response_time_ms,
            error: record.error.clone(),
            checked_at: record.checked_at,
        };
        match self.records.append_health(record).await {
            Ok(()) => outcome,
            Err(e) => {
                tracing::error!(provider_id = %provider.id, error = %e, "failed to record health check");
                HealthOutcome::without_probe(&provider.id, HealthStatus::Error, e.to_string())
            }
        }
    }

    async fn probe(&self, provider: &Provider) -> HealthCheckRecord {
        let url = models_url(&provider.base_url);
        let started = tokio::time::Instant::now();
        let result = tokio::time::timeout(
            self.timeout,
            self.transport.get(&url, Some(&provider.api_key), self.timeout),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (status, response_time_ms, error) = match result {
            Err(_) | Ok(Err(TransportError::Timeout(_))) => {
                (HealthStatus::Timeout, None, Some("request timed out".to_string()))
            }
            Ok(Err(e)) => (HealthStatus::Unhealthy, Some(elapsed_ms), Some(e.to_string())),
            Ok(Ok(resp)) if resp.status == 200 => (HealthStatus::Healthy, Some(elapsed_ms), None),
            Ok(Ok(resp)) => (
                HealthStatus::Unhealthy,
                Some(elapsed_ms),
                Some(format!("HTTP {}", resp.status)),
            ),
        };

        match status {
            HealthStatus::Healthy => {
                tracing::info!(provider_id = %provider.id, response_time_ms = elapsed_ms, "provider healthy")
            }
            _ => tracing::warn!(
                provider_id = %provider.id,
                status = status.as_str(),
                error = error.as_deref().unwrap_or(""),
                "provider health check failed"
            ),
        }

        HealthCheckRecord {
            provider_id: provider.id.clone(),
            status,
            response_time_ms,
            error,
            checked_at: Utc::now(),
        }
    }
}
