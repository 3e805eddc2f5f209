//! File-backed record store.
//!
//! Providers and models live in memory in insertion order and are rewritten
//! to `providers.json` / `models.json` (temp file + rename) on every
//! mutation. A mutation is applied to a copy, written, and only then made
//! visible, so a failed write leaves the store as it was.
//!
//! Health checks are appended one JSON object per line to
//! `health_checks.jsonl` and never rewritten. Memory keeps the latest check
//! per provider plus the most recent [`HEALTH_HISTORY_CAP`] checks of each.

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use ul_domain::error::{Error, Result};
use ul_domain::records::{HealthCheckRecord, ModelRecord, Provider};

use crate::repository::{HealthRepository, ModelFilter, ModelRepository, ProviderRepository};

const PROVIDERS_FILE: &str = "providers.json";
const MODELS_FILE: &str = "models.json";
const HEALTH_FILE: &str = "health_checks.jsonl";

/// In-memory health checks kept per provider. Older ones stay on disk only.
pub const HEALTH_HISTORY_CAP: usize = 500;

#[derive(Default)]
struct HealthLog {
    latest: HashMap<String, HealthCheckRecord>,
    recent: HashMap<String, VecDeque<HealthCheckRecord>>,
}

impl HealthLog {
    fn push(&mut self, record: HealthCheckRecord) {
        let newer = self
            .latest
            .get(&record.provider_id)
            .map_or(true, |cur| record.checked_at >= cur.checked_at);
        if newer {
            self.latest.insert(record.provider_id.clone(), record.clone());
        }
        let recent = self.recent.entry(record.provider_id.clone()).or_default();
        if recent.len() == HEALTH_HISTORY_CAP {
            recent.pop_front();
        }
        recent.push_back(record);
    }

    fn len(&self) -> usize {
        self.recent.values().map(VecDeque::len).sum()
    }
}

#[derive(Default)]
struct Inner {
    providers: Vec<Provider>,
    models: Vec<ModelRecord>,
    health: HealthLog,
}

pub struct JsonRecordStore {
    inner: RwLock<Inner>,
    /// `None` for a purely in-memory store.
    dir: Option<PathBuf>,
    /// Held for the whole copy-write-swap of a mutation, so mutations never
    /// interleave and an older snapshot never lands after a newer one.
    persist_lock: tokio::sync::Mutex<()>,
}

impl JsonRecordStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let providers: Vec<Provider> = load_json(&dir.join(PROVIDERS_FILE))?;
        let models: Vec<ModelRecord> = load_json(&dir.join(MODELS_FILE))?;
        let mut health = HealthLog::default();
        for record in load_jsonl(&dir.join(HEALTH_FILE)) {
            health.push(record);
        }

        tracing::info!(
            dir = %dir.display(),
            providers = providers.len(),
            models = models.len(),
            health_checks = health.len(),
            "record store loaded"
        );

        Ok(Self {
            inner: RwLock::new(Inner {
                providers,
                models,
                health,
            }),
            dir: Some(dir.to_path_buf()),
            persist_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            dir: None,
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Total provider count, enabled or not.
    pub fn provider_count(&self) -> usize {
        self.inner.read().providers.len()
    }

    /// Apply `change` to a copy of the provider list, persist the copy, then
    /// publish it. Nothing is published when `change` or the write fails.
    async fn commit_providers<R, F>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<Provider>) -> Result<R>,
    {
        let _guard = self.persist_lock.lock().await;
        let current = self.inner.read().providers.clone();
        let mut next = current.clone();
        let out = change(&mut next)?;
        if next != current {
            self.persist(PROVIDERS_FILE, &next).await?;
            self.inner.write().providers = next;
        }
        Ok(out)
    }

    /// Model-list counterpart of [`Self::commit_providers`].
    async fn commit_models<R, F>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<ModelRecord>) -> Result<R>,
    {
        let _guard = self.persist_lock.lock().await;
        let current = self.inner.read().models.clone();
        let mut next = current.clone();
        let out = change(&mut next)?;
        if next != current {
            self.persist(MODELS_FILE, &next).await?;
            self.inner.write().models = next;
        }
        Ok(out)
    }

    async fn persist<T: Serialize>(&self, file: &str, records: &[T]) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(records)?;
        let path = dir.join(file);
        write_in_background(path.clone(), json).await.map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "store write failed, change discarded");
            e
        })
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Providers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl ProviderRepository for JsonRecordStore {
    async fn get_provider(&self, id: &str) -> Result<Option<Provider>> {
        Ok(self
            .inner
            .read()
            .providers
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_providers(&self, enabled_only: bool) -> Result<Vec<Provider>> {
        Ok(self
            .inner
            .read()
            .providers
            .iter()
            .filter(|p| !enabled_only || p.enabled)
            .cloned()
            .collect())
    }

    async fn upsert_provider(&self, mut provider: Provider) -> Result<Provider> {
        self.commit_providers(move |providers| {
            provider.updated_at = Utc::now();
            match providers.iter_mut().find(|p| p.id == provider.id) {
                Some(existing) => {
                    provider.created_at = existing.created_at;
                    *existing = provider.clone();
                }
                None => providers.push(provider.clone()),
            }
            Ok(provider)
        })
        .await
    }

    async fn soft_delete_provider(&self, id: &str) -> Result<bool> {
        self.commit_providers(|providers| {
            Ok(match providers.iter_mut().find(|p| p.id == id) {
                Some(p) => {
                    p.enabled = false;
                    p.updated_at = Utc::now();
                    true
                }
                None => false,
            })
        })
        .await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Models
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl ModelRepository for JsonRecordStore {
    async fn get_model(&self, id: &str) -> Result<Option<ModelRecord>> {
        Ok(self
            .inner
            .read()
            .models
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn find_model(
        &self,
        provider_id: &str,
        original_name: &str,
    ) -> Result<Option<ModelRecord>> {
        Ok(self
            .inner
            .read()
            .models
            .iter()
            .find(|m| m.provider_id == provider_id && m.original_name == original_name)
            .cloned())
    }

    async fn list_models(&self, filter: &ModelFilter) -> Result<Vec<ModelRecord>> {
        Ok(self
            .inner
            .read()
            .models
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }

    async fn upsert_model(&self, model: ModelRecord) -> Result<ModelRecord> {
        self.commit_models(move |models| {
            let duplicate = models.iter().any(|m| {
                m.id != model.id
                    && m.provider_id == model.provider_id
                    && m.original_name == model.original_name
            });
            if duplicate {
                return Err(Error::Conflict(format!(
                    "model '{}' already exists for provider '{}'",
                    model.original_name, model.provider_id
                )));
            }
            match models.iter_mut().find(|m| m.id == model.id) {
                Some(existing) => *existing = model.clone(),
                None => models.push(model.clone()),
            }
            Ok(model)
        })
        .await
    }

    async fn soft_delete_model(&self, id: &str) -> Result<bool> {
        self.commit_models(|models| {
            Ok(match models.iter_mut().find(|m| m.id == id) {
                Some(m) => {
                    m.enabled = false;
                    m.updated_at = Utc::now();
                    true
                }
                None => false,
            })
        })
        .await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Health checks
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
impl HealthRepository for JsonRecordStore {
    async fn append_health(&self, record: HealthCheckRecord) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        if let Some(dir) = &self.dir {
            let line = serde_json::to_string(&record)?;
            let path = dir.join(HEALTH_FILE);
            tokio::task::spawn_blocking(move || -> std::io::Result<()> {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)?;
                writeln!(file, "{line}")
            })
            .await
            .map_err(|e| Error::Other(format!("health log writer panicked: {e}")))??;
        }
        self.inner.write().health.push(record);
        Ok(())
    }

    /// Newest first, limited to what is kept in memory.
    async fn health_history(
        &self,
        provider_id: &str,
        limit: usize,
    ) -> Result<Vec<HealthCheckRecord>> {
        let inner = self.inner.read();
        let mut records: Vec<HealthCheckRecord> = inner
            .health
            .recent
            .get(provider_id)
            .map(|r| r.iter().rev().cloned().collect())
            .unwrap_or_default();
        // Equal timestamps keep the later append first.
        records.sort_by(|a, b| b.checked_at.cmp(&a.checked_at));
        records.truncate(limit);
        Ok(records)
    }

    async fn latest_health(&self) -> Result<Vec<HealthCheckRecord>> {
        let mut out: Vec<HealthCheckRecord> =
            self.inner.read().health.latest.values().cloned().collect();
        out.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        Ok(out)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// File helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn load_jsonl<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(rec) => out.push(rec),
            Err(e) => tracing::warn!(
                path = %path.display(),
                line = lineno + 1,
                error = %e,
                "skipping unreadable record"
            ),
        }
    }
    out
}

async fn write_in_background(path: PathBuf, bytes: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
        .await
        .map_err(|e| Error::Other(format!("store writer panicked: {e}")))?
        .map_err(Error::from)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
