//! One-shot CLI commands. Each boots the same state as `serve`, runs a
//! single operation and prints the result to stdout.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;

use ul_domain::config::Config;
use ul_routing::{validate_document, DocumentKind, DocumentValidation};

use crate::bootstrap;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("serializing output")?
    );
    Ok(())
}

/// `uniload discover [--provider ID]...`. Returns `false` when any
/// provider failed.
pub async fn discover(config: Arc<Config>, providers: Vec<String>) -> anyhow::Result<bool> {
    let state = bootstrap::build_app_state(config).await?;
    let ids = (!providers.is_empty()).then_some(providers.as_slice());
    let report = state.discovery.refresh(ids).await?;
    print_json(&report)?;
    Ok(report.summary.failed == 0)
}

/// `uniload health`. Returns `false` when any provider is not healthy.
pub async fn health(config: Arc<Config>) -> anyhow::Result<bool> {
    let state = bootstrap::build_app_state(config).await?;
    let batch = state.health.check_all().await?;
    print_json(&batch)?;
    Ok(batch.summary.healthy == batch.summary.total)
}

/// `uniload generate [--dry-run]`.
pub async fn generate(config: Arc<Config>, dry_run: bool) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config).await?;
    if dry_run {
        let preview = state.engine.preview().await?;
        let (routing, unified) = state.engine.output_paths();
        println!("# {}\n{}", routing.display(), preview.routing_yaml);
        println!("# {}\n{}", unified.display(), preview.unified_yaml);
        return Ok(());
    }
    let generated = state.engine.generate().await?;
    print_json(&serde_json::json!({
        "stats": generated.stats,
        "saved": generated.saved,
    }))
}

/// `uniload validate --kind KIND FILE`. Returns `false` when the document
/// has problems.
pub fn validate(kind: DocumentKind, file: &Path) -> anyhow::Result<bool> {
    let report = validate_file(kind, file)?;
    if report.valid {
        println!("{} document OK ({})", kind, file.display());
    } else {
        for e in &report.errors {
            println!("{e}");
        }
        println!("\n{} problem(s) in {}", report.errors.len(), file.display());
    }
    Ok(report.valid)
}

fn validate_file(kind: DocumentKind, file: &Path) -> anyhow::Result<DocumentValidation> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let doc: serde_json::Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("parsing {} as YAML", file.display()))?;
    Ok(validate_document(&doc, kind))
}
