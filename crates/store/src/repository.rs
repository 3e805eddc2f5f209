use ul_domain::error::Result;
use ul_domain::records::{HealthCheckRecord, ModelRecord, Provider};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Repository traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Provider records. `list_providers` returns records in insertion order.
#[async_trait::async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn get_provider(&self, id: &str) -> Result<Option<Provider>>;

    async fn list_providers(&self, enabled_only: bool) -> Result<Vec<Provider>>;

    /// Insert a new provider or replace the one with the same id. The
    /// original `created_at` is kept on replace.
    async fn upsert_provider(&self, provider: Provider) -> Result<Provider>;

    /// Mark a provider disabled. Returns `false` when the id is unknown.
    async fn soft_delete_provider(&self, id: &str) -> Result<bool>;
}

/// Model listing filter.
#[derive(Debug, Clone, Default)]
pub struct ModelFilter {
    pub provider_id: Option<String>,
    pub enabled_only: bool,
}

impl ModelFilter {
    pub fn enabled() -> Self {
        Self {
            provider_id: None,
            enabled_only: true,
        }
    }

    pub fn matches(&self, model: &ModelRecord) -> bool {
        if self.enabled_only && !model.enabled {
            return false;
        }
        match &self.provider_id {
            Some(pid) => &model.provider_id == pid,
            None => true,
        }
    }
}

/// Model records. Listing preserves insertion order, which the routing
/// builder relies on for stable routing unit indices.
#[async_trait::async_trait]
pub trait ModelRepository: Send + Sync {
    async fn get_model(&self, id: &str) -> Result<Option<ModelRecord>>;

    async fn find_model(&self, provider_id: &str, original_name: &str)
        -> Result<Option<ModelRecord>>;

    async fn list_models(&self, filter: &ModelFilter) -> Result<Vec<ModelRecord>>;

    /// Insert or replace by `id`. Fails with a conflict when another record
    /// already holds the same `(original_name, provider_id)` pair.
    async fn upsert_model(&self, model: ModelRecord) -> Result<ModelRecord>;

    /// Mark a model disabled without removing it. Returns `false` when the
    /// id is unknown.
    async fn soft_delete_model(&self, id: &str) -> Result<bool>;
}

/// Append-only health check log.
#[async_trait::async_trait]
pub trait HealthRepository: Send + Sync {
    async fn append_health(&self, record: HealthCheckRecord) -> Result<()>;

    /// Newest first, at most `limit` records.
    async fn health_history(&self, provider_id: &str, limit: usize)
        -> Result<Vec<HealthCheckRecord>>;

    /// The most recent record of every provider that has one.
    async fn latest_health(&self) -> Result<Vec<HealthCheckRecord>>;
}
