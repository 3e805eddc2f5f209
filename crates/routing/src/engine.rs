//! Facade tying the builder, renderer and writer together.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use ul_domain::config::OutputConfig;
use ul_domain::error::{Error, Result};
use ul_store::{ModelRepository, ProviderRepository};

use crate::builder::{RoutingBuilder, RoutingPlan};
use crate::render::{RenderedDocuments, RoutingDocument, UnifiedDocument};
use crate::validate::validate_plan;
use crate::writer::{ConfigWriter, WriteReport};

#[derive(Debug, Clone, Serialize)]
pub struct PlanStats {
    pub units: usize,
    pub aggregates: usize,
    pub redirects: usize,
}

impl From<&RoutingPlan> for PlanStats {
    fn from(plan: &RoutingPlan) -> Self {
        Self {
            units: plan.units.len(),
            aggregates: plan.aggregates.len(),
            redirects: plan.redirects.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SavedConfig {
    pub routing: WriteReport,
    pub unified: WriteReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedConfig {
    pub stats: PlanStats,
    pub saved: SavedConfig,
    pub routing: RoutingDocument,
    pub unified: UnifiedDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigPreview {
    pub stats: PlanStats,
    pub routing_yaml: String,
    pub unified_yaml: String,
}

pub struct RoutingEngine {
    builder: RoutingBuilder,
    writer: ConfigWriter,
    output: OutputConfig,
}

impl RoutingEngine {
    pub fn new(
        providers: Arc<dyn ProviderRepository>,
        models: Arc<dyn ModelRepository>,
        output: OutputConfig,
    ) -> Self {
        Self {
            builder: RoutingBuilder::new(providers, models),
            writer: ConfigWriter::new(output.backup_dir()),
            output,
        }
    }

    pub async fn build(&self) -> Result<RoutingPlan> {
        self.builder.build().await
    }

    /// Render both documents without touching the disk.
    pub async fn preview(&self) -> Result<ConfigPreview> {
        let plan = self.build().await?;
        validate_plan(&plan)?;
        let (routing_yaml, unified_yaml) =
            RenderedDocuments::render(&plan, &self.output).to_yaml()?;
        Ok(ConfigPreview {
            stats: PlanStats::from(&plan),
            routing_yaml,
            unified_yaml,
        })
    }

    /// Validate, render and write both documents for `plan`. Nothing is
    /// written unless the whole plan validates and both documents serialize.
    pub async fn render_and_save(&self, plan: &RoutingPlan) -> Result<(SavedConfig, RenderedDocuments)> {
        validate_plan(plan)?;
        let docs = RenderedDocuments::render(plan, &self.output);
        let (routing_yaml, unified_yaml) = docs.to_yaml()?;

        let mut reports = self
            .writer
            .write_set(vec![
                (self.output.routing_path(), routing_yaml.into_bytes()),
                (self.output.unified_path(), unified_yaml.into_bytes()),
            ])
            .await?
            .into_iter();
        let (Some(routing), Some(unified)) = (reports.next(), reports.next()) else {
            return Err(Error::Other("config writer returned too few reports".into()));
        };
        Ok((SavedConfig { routing, unified }, docs))
    }

    /// Build from the store, then validate and save.
    pub async fn generate(&self) -> Result<GeneratedConfig> {
        let plan = self.build().await?;
        let (saved, docs) = self.render_and_save(&plan).await?;
        tracing::info!(
            routing = %saved.routing.path.display(),
            unified = %saved.unified.path.display(),
            units = plan.units.len(),
            "routing configuration generated"
        );
        Ok(GeneratedConfig {
            stats: PlanStats::from(&plan),
            saved,
            routing: docs.routing,
            unified: docs.unified,
        })
    }

    pub fn output_paths(&self) -> (PathBuf, PathBuf) {
        (self.output.routing_path(), self.output.unified_path())
    }
}
