//! Plain data records owned by the record store.
//!
//! The engine only ever reads providers; models are written by discovery and
//! the model management operations; health checks are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Provider
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// An upstream OpenAI-compatible API provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Caller-assigned unique identifier.
    pub id: String,
    /// Display name. Also the prefix of every routing unit id derived from
    /// this provider.
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// Stored for operators; the routing builder does not consult it.
    #[serde(default)]
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Provider {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            enabled: true,
            priority: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A model discovered on a provider.
///
/// `(original_name, provider_id)` is unique across the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub id: String,
    /// Name as reported by the provider's catalogue.
    pub original_name: String,
    /// Canonicalized name, computed once at discovery time.
    pub canonical_name: String,
    /// User override for the unified name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub provider_id: String,
    /// `false` once soft-deleted.
    #[serde(default = "d_true")]
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ModelRecord {
    pub fn new(
        provider_id: impl Into<String>,
        original_name: impl Into<String>,
        canonical_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original_name: original_name.into(),
            canonical_name: canonical_name.into(),
            display_name: None,
            provider_id: provider_id.into(),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// The name this model is routed under: the override if set, otherwise
    /// the canonical name.
    pub fn unified_name(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or(self.canonical_name.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Health checks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Timeout,
    Error,
    NotFound,
}

impl HealthStatus {
    /// Unhealthy and timed-out providers are reported as failing.
    pub fn is_failing(self) -> bool {
        matches!(self, Self::Unhealthy | Self::Timeout)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Timeout => "timeout",
            Self::Error => "error",
            Self::NotFound => "not_found",
        }
    }
}

/// One liveness probe result. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckRecord {
    pub provider_id: String,
    pub status: HealthStatus,
    /// Absent when the probe timed out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

fn d_true() -> bool {
    true
}
