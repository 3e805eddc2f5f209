//! Model management operations layered over [`ModelRepository`]:
//! discovery upserts, display-name overrides, soft deletes and counts.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use ul_domain::error::{Error, Result};
use ul_domain::records::ModelRecord;

use crate::repository::{ModelFilter, ModelRepository};

/// Whether a discovery upsert created a record or refreshed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenameRequest {
    pub model_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub model_id: String,
    pub error: String,
}

/// Result of a batch operation. Items are processed independently; one
/// failure never stops the rest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub succeeded: Vec<String>,
    pub failures: Vec<BatchFailure>,
}

impl BatchResult {
    fn record(&mut self, model_id: String, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.succeeded.push(model_id),
            Err(e) => self.failures.push(BatchFailure {
                model_id,
                error: e.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderModelCount {
    pub total: usize,
    pub enabled: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelStatistics {
    pub total: usize,
    pub enabled: usize,
    pub deleted: usize,
    /// Enabled models carrying a display-name override.
    pub renamed: usize,
    pub by_provider: BTreeMap<String, ProviderModelCount>,
}

pub struct ModelManager {
    models: Arc<dyn ModelRepository>,
}

impl ModelManager {
    pub fn new(models: Arc<dyn ModelRepository>) -> Self {
        Self { models }
    }

    /// Insert a discovered model, or refresh the canonical name of the
    /// existing `(provider_id, original_name)` record. A soft-deleted record
    /// stays deleted.
    pub async fn record_discovered(
        &self,
        provider_id: &str,
        original_name: &str,
        canonical_name: &str,
    ) -> Result<(ModelRecord, UpsertAction)> {
        match self.models.find_model(provider_id, original_name).await? {
            Some(mut existing) => {
                existing.canonical_name = canonical_name.to_string();
                existing.updated_at = Utc::now();
                let saved = self.models.upsert_model(existing).await?;
                Ok((saved, UpsertAction::Updated))
            }
            None => {
                let record = ModelRecord::new(provider_id, original_name, canonical_name);
                let saved = self.models.upsert_model(record).await?;
                Ok((saved, UpsertAction::Created))
            }
        }
    }

    /// Set the display-name override of one model. The name must be unique
    /// among the display names of the same provider's enabled models.
    pub async fn rename(&self, model_id: &str, display_name: &str) -> Result<ModelRecord> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(Error::validation("display_name must not be empty"));
        }

        let mut model = self
            .models
            .get_model(model_id)
            .await?
            .ok_or_else(|| Error::not_found("model", model_id))?;

        let siblings = self
            .models
            .list_models(&ModelFilter {
                provider_id: Some(model.provider_id.clone()),
                enabled_only: true,
            })
            .await?;
        let taken = siblings
            .iter()
            .any(|m| m.id != model.id && m.display_name.as_deref() == Some(display_name));
        if taken {
            return Err(Error::Conflict(format!(
                "display name '{display_name}' is already used by provider '{}'",
                model.provider_id
            )));
        }

        model.display_name = Some(display_name.to_string());
        model.updated_at = Utc::now();
        let saved = self.models.upsert_model(model).await?;
        tracing::info!(model_id = %saved.id, display_name, "model renamed");
        Ok(saved)
    }

    pub async fn batch_rename(&self, requests: Vec<RenameRequest>) -> BatchResult {
        let mut result = BatchResult::default();
        for req in requests {
            let outcome = self.rename(&req.model_id, &req.display_name).await.map(|_| ());
            result.record(req.model_id, outcome);
        }
        result
    }

    /// Soft-delete one model.
    pub async fn delete(&self, model_id: &str) -> Result<()> {
        if self.models.soft_delete_model(model_id).await? {
            tracing::info!(model_id, "model disabled");
            Ok(())
        } else {
            Err(Error::not_found("model", model_id))
        }
    }

    pub async fn batch_delete(&self, model_ids: Vec<String>) -> BatchResult {
        let mut result = BatchResult::default();
        for id in model_ids {
            let outcome = self.delete(&id).await;
            result.record(id, outcome);
        }
        result
    }

    pub async fn statistics(&self) -> Result<ModelStatistics> {
        let all = self.models.list_models(&ModelFilter::default()).await?;
        let mut stats = ModelStatistics {
            total: all.len(),
            ..Default::default()
        };
        for m in &all {
            let per = stats.by_provider.entry(m.provider_id.clone()).or_default();
            per.total += 1;
            if m.enabled {
                per.enabled += 1;
                stats.enabled += 1;
                if m.display_name.is_some() {
                    stats.renamed += 1;
                }
            } else {
                stats.deleted += 1;
            }
        }
        Ok(stats)
    }
}
