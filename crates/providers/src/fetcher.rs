//! Catalogue fetcher: `GET {base}/v1/models` against many providers with
//! bounded parallelism and retry/backoff.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use ul_domain::config::DiscoveryConfig;
use ul_domain::error::{Error, ErrorKind, Result};

use crate::catalogue::{parse_catalogue, Catalogue};
use crate::pool::fan_out;
use crate::transport::{CatalogueTransport, TransportError};
use crate::util::{models_url, snippet};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One provider endpoint to query.
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub id: String,
    pub base_url: String,
    pub api_key: String,
}

/// Retry on 429, 5xx and timeouts. The wait before retry `n` (0-based) is
/// `backoff_factor ^ n` seconds.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
}

impl RetryPolicy {
    pub fn delay(&self, retry: u32) -> Duration {
        let secs = self.backoff_factor.powi(retry as i32);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else {
            Duration::ZERO
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub source_id: String,
    pub success: bool,
    pub models: Vec<Value>,
    /// `None` on success and on an unrecognized (but valid JSON) body.
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Requests issued, including the first.
    pub attempts: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchBatch {
    /// One outcome per input source, in input order.
    pub outcomes: Vec<FetchOutcome>,
    pub summary: BatchSummary,
}

impl FetchBatch {
    pub fn get(&self, source_id: &str) -> Option<&FetchOutcome> {
        self.outcomes.iter().find(|o| o.source_id == source_id)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Fetcher
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct CatalogueFetcher {
    transport: Arc<dyn CatalogueTransport>,
    retry: RetryPolicy,
    timeout: Duration,
    max_concurrent: usize,
}

impl CatalogueFetcher {
    pub fn new(
        transport: Arc<dyn CatalogueTransport>,
        retry: RetryPolicy,
        timeout: Duration,
        max_concurrent: usize,
    ) -> Self {
        Self {
            transport,
            retry,
            timeout,
            max_concurrent,
        }
    }

    pub fn from_config(cfg: &DiscoveryConfig, transport: Arc<dyn CatalogueTransport>) -> Self {
        Self::new(
            transport,
            RetryPolicy {
                max_retries: cfg.max_retries,
                backoff_factor: cfg.backoff_factor,
            },
            cfg.timeout(),
            cfg.max_concurrent,
        )
    }

    /// Fetch every source. Always returns one outcome per source; individual
    /// failures are recorded in the outcome.
    pub async fn fetch_all(&self, sources: Vec<SourceSpec>) -> FetchBatch {
        let total = sources.len();
        tracing::info!(total, max_concurrent = self.max_concurrent, "catalogue fetch started");

        let outcomes = fan_out(sources, self.max_concurrent, |source| async move {
            self.fetch_one(&source).await
        })
        .await;

        let success = outcomes.iter().filter(|o| o.success).count();
        let summary = BatchSummary {
            total,
            success,
            failed: total - success,
        };
        tracing::info!(
            total = summary.total,
            success = summary.success,
            failed = summary.failed,
            "catalogue fetch finished"
        );
        FetchBatch { outcomes, summary }
    }

    /// Fetch a single source, retrying transient failures.
    pub async fn fetch_one(&self, source: &SourceSpec) -> FetchOutcome {
        let url = models_url(&source.base_url);
        let mut retry = 0u32;

        loop {
            let attempts = retry + 1;
            match self.attempt(&url, &source.api_key).await {
                Ok(Catalogue::Models(models)) => {
                    tracing::info!(
                        source_id = %source.id,
                        models = models.len(),
                        attempts,
                        "catalogue fetched"
                    );
                    return FetchOutcome {
                        source_id: source.id.clone(),
                        success: true,
                        models,
                        error: None,
                        error_kind: None,
                        attempts,
                    };
                }
                Ok(Catalogue::Unrecognized) => {
                    tracing::warn!(source_id = %source.id, %url, "unrecognized catalogue shape");
                    return FetchOutcome {
                        source_id: source.id.clone(),
                        success: false,
                        models: Vec::new(),
                        error: None,
                        error_kind: None,
                        attempts,
                    };
                }
                Err(e @ Error::TransientNetwork(_)) if retry < self.retry.max_retries => {
                    let wait = self.retry.delay(retry);
                    tracing::warn!(
                        source_id = %source.id,
                        attempt = attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %e,
                        "transient catalogue failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    retry += 1;
                }
                Err(e) => {
                    tracing::error!(
                        source_id = %source.id,
                        attempts,
                        error = %e,
                        "catalogue fetch failed"
                    );
                    return FetchOutcome {
                        source_id: source.id.clone(),
                        success: false,
                        models: Vec::new(),
                        error: Some(e.to_string()),
                        error_kind: Some(e.kind()),
                        attempts,
                    };
                }
            }
        }
    }

    async fn attempt(&self, url: &str, api_key: &str) -> Result<Catalogue> {
        let resp = self
            .transport
            .get(url, Some(api_key), self.timeout)
            .await
            .map_err(|e| match e {
                TransportError::Timeout(_) => Error::TransientNetwork(e.to_string()),
                TransportError::Connect(_) | TransportError::Other(_) => {
                    Error::TerminalNetwork(e.to_string())
                }
            })?;

        match resp.status {
            429 => Err(Error::TransientNetwork("HTTP 429 (rate limited)".into())),
            500..=599 => Err(Error::TransientNetwork(format!("HTTP {}", resp.status))),
            _ if !resp.is_success() => Err(Error::TerminalNetwork(format!(
                "HTTP {}: {}",
                resp.status,
                snippet(&resp.body)
            ))),
            _ => parse_catalogue(&resp.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_double() {
        let p = RetryPolicy::default();
        assert_eq!(p.delay(0), Duration::from_secs(1));
        assert_eq!(p.delay(1), Duration::from_secs(2));
        assert_eq!(p.delay(2), Duration::from_secs(4));
    }

    #[test]
    fn degenerate_factor_does_not_panic() {
        let p = RetryPolicy {
            max_retries: 1,
            backoff_factor: 0.0,
        };
        assert_eq!(p.delay(0), Duration::from_secs(1));
        assert_eq!(p.delay(1), Duration::ZERO);
    }
}
