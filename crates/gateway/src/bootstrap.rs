//! AppState construction and background-task spawning extracted from `main.rs`.
//!
//! `serve` and the one-shot CLI commands (`discover`, `health`, `generate`)
//! share [`build_app_state`] so they run against the same wiring.

use std::sync::Arc;

use anyhow::Context;

use ul_domain::config::{Config, ConfigSeverity};
use ul_domain::Canonicalizer;
use ul_providers::{
    CatalogueFetcher, CatalogueTransport, Discovery, DownstreamProbe, HealthMonitor, HttpTransport,
};
use ul_routing::RoutingEngine;
use ul_store::{JsonRecordStore, ModelManager};

use crate::state::AppState;

/// Validate config, open the record store and return a fully-wired
/// [`AppState`] using the real HTTP transport.
pub async fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Record store ─────────────────────────────────────────────────
    let store = Arc::new(
        JsonRecordStore::open(&config.store.data_dir)
            .with_context(|| format!("opening record store at {}", config.store.data_dir.display()))?,
    );
    tracing::info!(
        path = %config.store.data_dir.display(),
        providers = store.provider_count(),
        "record store ready"
    );

    // ── Transport ────────────────────────────────────────────────────
    let transport: Arc<dyn CatalogueTransport> =
        Arc::new(HttpTransport::new().context("building HTTP client")?);

    wire_state(config, store, transport)
}

/// Assemble the components around an already opened store and transport.
pub fn wire_state(
    config: Arc<Config>,
    store: Arc<JsonRecordStore>,
    transport: Arc<dyn CatalogueTransport>,
) -> anyhow::Result<AppState> {
    // ── Name canonicalizer ───────────────────────────────────────────
    let canonicalizer = Arc::new(
        Canonicalizer::from_rules(&config.normalization.rules)
            .context("compiling normalization rules")?,
    );

    // ── Discovery ────────────────────────────────────────────────────
    let fetcher = Arc::new(CatalogueFetcher::from_config(
        &config.discovery,
        transport.clone(),
    ));
    let discovery = Arc::new(Discovery::new(
        store.clone(),
        store.clone(),
        fetcher,
        canonicalizer,
    ));

    // ── Health & downstream probes ───────────────────────────────────
    let health = Arc::new(HealthMonitor::new(
        store.clone(),
        store.clone(),
        transport.clone(),
        &config.health,
    ));
    let downstream = Arc::new(DownstreamProbe::new(transport, &config.downstream));

    // ── Routing output ───────────────────────────────────────────────
    let engine = Arc::new(RoutingEngine::new(
        store.clone(),
        store.clone(),
        config.output.clone(),
    ));
    let (routing_path, unified_path) = engine.output_paths();
    tracing::info!(
        routing = %routing_path.display(),
        unified = %unified_path.display(),
        "routing output configured"
    );

    Ok(AppState {
        models: Arc::new(ModelManager::new(store.clone())),
        config,
        store,
        discovery,
        health,
        downstream,
        engine,
    })
}

/// Spawn the periodic loops that run alongside the admin server.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Periodic provider health checks ──────────────────────────────
    if state.config.health.enabled {
        let health = state.health.clone();
        let period = state.config.health.interval();
        tracing::info!(interval_secs = period.as_secs(), "periodic health checks enabled");
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                match health.check_all().await {
                    Ok(batch) => tracing::info!(
                        total = batch.summary.total,
                        healthy = batch.summary.healthy,
                        unhealthy = batch.summary.unhealthy,
                        timeout = batch.summary.timeout,
                        "periodic health check finished"
                    ),
                    Err(e) => tracing::warn!(error = %e, "periodic health check failed"),
                }
            }
        });
    } else {
        tracing::info!("periodic health checks disabled");
    }
}
