//! Model discovery: fetch catalogues, canonicalize names, upsert records.

use std::sync::Arc;

use serde::Serialize;

use ul_domain::error::{Error, Result};
use ul_domain::records::Provider;
use ul_domain::Canonicalizer;
use ul_store::manager::UpsertAction;
use ul_store::{ModelManager, ModelRepository, ProviderRepository};

use crate::catalogue::model_name;
use crate::fetcher::{BatchSummary, CatalogueFetcher, FetchOutcome, SourceSpec};

/// Per-provider result of a refresh.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderRefresh {
    pub provider_id: String,
    pub success: bool,
    pub created: usize,
    pub updated: usize,
    /// Catalogue entries without a usable name.
    pub skipped: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub providers: Vec<ProviderRefresh>,
    pub summary: BatchSummary,
}

pub struct Discovery {
    providers: Arc<dyn ProviderRepository>,
    models: ModelManager,
    fetcher: Arc<CatalogueFetcher>,
    canonicalizer: Arc<Canonicalizer>,
}

impl Discovery {
    pub fn new(
        providers: Arc<dyn ProviderRepository>,
        models: Arc<dyn ModelRepository>,
        fetcher: Arc<CatalogueFetcher>,
        canonicalizer: Arc<Canonicalizer>,
    ) -> Self {
        Self {
            providers,
            models: ModelManager::new(models),
            fetcher,
            canonicalizer,
        }
    }

    /// Refresh the given providers, or every enabled provider when `ids` is
    /// `None`. Explicitly named providers are refreshed even when disabled;
    /// an unknown id fails the whole call before any request is made.
    pub async fn refresh(&self, ids: Option<&[String]>) -> Result<DiscoveryReport> {
        let targets: Vec<Provider> = match ids {
            None => self.providers.list_providers(true).await?,
            Some(ids) => {
                let mut out = Vec::with_capacity(ids.len());
                for id in ids {
                    let p = self
                        .providers
                        .get_provider(id)
                        .await?
                        .ok_or_else(|| Error::not_found("provider", id.clone()))?;
                    out.push(p);
                }
                out
            }
        };

        let sources = targets
            .iter()
            .map(|p| SourceSpec {
                id: p.id.clone(),
                base_url: p.base_url.clone(),
                api_key: p.api_key.clone(),
            })
            .collect();
        let batch = self.fetcher.fetch_all(sources).await;

        let mut providers = Vec::with_capacity(batch.outcomes.len());
        for outcome in &batch.outcomes {
            providers.push(self.store_outcome(outcome).await);
        }

        Ok(DiscoveryReport {
            providers,
            summary: batch.summary,
        })
    }

    async fn store_outcome(&self, outcome: &FetchOutcome) -> ProviderRefresh {
        let mut report = ProviderRefresh {
            provider_id: outcome.source_id.clone(),
            success: outcome.success,
            created: 0,
            updated: 0,
            skipped: 0,
            error: outcome.error.clone(),
        };
        if !outcome.success {
            return report;
        }

        for entry in &outcome.models {
            let Some(original) = model_name(entry) else {
                report.skipped += 1;
                continue;
            };
            let canonical = self.canonicalizer.canonicalize(&original);
            match self
                .models
                .record_discovered(&outcome.source_id, &original, &canonical)
                .await
            {
                Ok((_, UpsertAction::Created)) => report.created += 1,
                Ok((_, UpsertAction::Updated)) => report.updated += 1,
                Err(e) => {
                    tracing::error!(
                        provider_id = %outcome.source_id,
                        model = %original,
                        error = %e,
                        "failed to store discovered model"
                    );
                    report.success = false;
                    report.error = Some(e.to_string());
                    break;
                }
            }
        }

        tracing::info!(
            provider_id = %report.provider_id,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            "discovery stored"
        );
        report
    }
}
