//! Rendering a [`RoutingPlan`] into the two downstream documents.
//!
//! Document A feeds the load-balancing routing service; document B feeds the
//! unified API service and points every unified name back at the routing
//! service's proxy path.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};

use ul_domain::config::OutputConfig;
use ul_domain::error::Result;

use crate::builder::RoutingPlan;

pub const GROUP_STRATEGY: &str = "fixed_priority";
pub const UNIFIED_API_KIND: &str = "openai";
pub const UNIFIED_PROVIDER_PREFIX: &str = "gptload-";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Document A: routing service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDocument {
    pub providers: Vec<RoutingProviderEntry>,
    pub groups: Vec<RoutingGroupEntry>,
    pub aggregate_groups: Vec<AggregateGroupEntry>,
    /// unified name -> unit id or aggregate group name, insertion ordered.
    pub model_redirects: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingProviderEntry {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub models: Vec<String>,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingGroupEntry {
    pub name: String,
    pub providers: Vec<String>,
    pub strategy: String,
    pub model_mapping: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateGroupEntry {
    pub name: String,
    pub sub_groups: Vec<String>,
    pub load_balance: String,
}

pub fn render_routing(plan: &RoutingPlan) -> RoutingDocument {
    let providers = plan
        .units
        .iter()
        .map(|u| RoutingProviderEntry {
            name: u.id.clone(),
            base_url: u.base_url.clone(),
            api_key: u.api_key.clone(),
            models: vec![u.original_name.clone()],
            enabled: true,
        })
        .collect();

    let groups = plan
        .units
        .iter()
        .map(|u| {
            let mut mapping = Mapping::new();
            mapping.insert(
                Value::String(u.unified_name.clone()),
                Value::String(u.original_name.clone()),
            );
            RoutingGroupEntry {
                name: u.group_name(),
                providers: vec![u.id.clone()],
                strategy: GROUP_STRATEGY.to_string(),
                model_mapping: mapping,
            }
        })
        .collect();

    let aggregate_groups = plan
        .aggregates
        .iter()
        .map(|a| AggregateGroupEntry {
            name: a.name.clone(),
            sub_groups: a.members.clone(),
            load_balance: a.load_balance.as_str().to_string(),
        })
        .collect();

    let mut model_redirects = Mapping::new();
    for r in &plan.redirects {
        model_redirects.insert(
            Value::String(r.unified_name.clone()),
            Value::String(r.target.clone()),
        );
    }

    RoutingDocument {
        providers,
        groups,
        aggregate_groups,
        model_redirects,
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Document B: unified API service
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDocument {
    pub providers: Vec<UnifiedProviderEntry>,
    pub api: UnifiedApiSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedProviderEntry {
    pub provider: String,
    pub base_url: String,
    pub api: String,
    pub model: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedApiSection {
    pub port: u16,
    pub bind: String,
}

/// One entry per unified name, in redirect order.
pub fn render_unified(plan: &RoutingPlan, output: &OutputConfig) -> UnifiedDocument {
    let root = output.gateway_root.trim_end_matches('/');
    let providers = plan
        .redirects
        .iter()
        .map(|r| UnifiedProviderEntry {
            provider: format!("{UNIFIED_PROVIDER_PREFIX}{}", r.unified_name),
            base_url: format!("{root}/proxy/{}", r.unified_name),
            api: UNIFIED_API_KIND.to_string(),
            model: vec![r.unified_name.clone()],
        })
        .collect();

    UnifiedDocument {
        providers,
        api: UnifiedApiSection {
            port: output.unified_api.port,
            bind: output.unified_api.bind.clone(),
        },
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// YAML
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Both documents of one plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocuments {
    pub routing: RoutingDocument,
    pub unified: UnifiedDocument,
}

impl RenderedDocuments {
    pub fn render(plan: &RoutingPlan, output: &OutputConfig) -> Self {
        Self {
            routing: render_routing(plan),
            unified: render_unified(plan, output),
        }
    }

    pub fn to_yaml(&self) -> Result<(String, String)> {
        Ok((
            serde_yaml::to_string(&self.routing)?,
            serde_yaml::to_string(&self.unified)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_plan;
    use ul_domain::records::{ModelRecord, Provider};

    fn plan() -> RoutingPlan {
        let providers = vec![
            Provider::new("p1", "Alpha", "https://a.example.com/", "sk-a"),
            Provider::new("p2", "Beta", "https://b.example.com", "sk-b"),
        ];
        let models = vec![
            ModelRecord::new("p1", "gpt-4-0613", "gpt-4"),
            ModelRecord::new("p2", "gpt-4", "gpt-4"),
            ModelRecord::new("p2", "claude-3-haiku-20240307", "claude-3-haiku"),
        ];
        build_plan(&providers, &models)
    }

    #[test]
    fn routing_document_shape() {
        let doc = render_routing(&plan());
        assert_eq!(doc.providers.len(), 3);
        assert_eq!(doc.providers[0].name, "Alpha-0");
        assert_eq!(doc.providers[0].base_url, "https://a.example.com");
        assert_eq!(doc.providers[0].models, vec!["gpt-4-0613"]);

        assert_eq!(doc.groups[0].name, "Alpha-0-gpt-4");
        assert_eq!(doc.groups[0].strategy, "fixed_priority");
        assert_eq!(
            doc.groups[0].model_mapping.get("gpt-4").and_then(Value::as_str),
            Some("gpt-4-0613")
        );

        assert_eq!(doc.aggregate_groups.len(), 1);
        assert_eq!(doc.aggregate_groups[0].sub_groups, vec!["Alpha-0", "Beta-0"]);

        let keys: Vec<&str> = doc.model_redirects.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["gpt-4", "claude-3-haiku"]);
    }

    #[test]
    fn unified_document_points_at_gateway_proxy() {
        let mut output = OutputConfig::default();
        output.gateway_root = "http://routing:3001/".into();
        let doc = render_unified(&plan(), &output);

        assert_eq!(doc.providers.len(), 2);
        assert_eq!(doc.providers[0].provider, "gptload-gpt-4");
        assert_eq!(doc.providers[0].base_url, "http://routing:3001/proxy/gpt-4");
        assert_eq!(doc.providers[0].api, "openai");
        assert_eq!(doc.providers[1].model, vec!["claude-3-haiku"]);
        assert_eq!(doc.api.port, 8000);
        assert_eq!(doc.api.bind, "0.0.0.0");
    }

    #[test]
    fn yaml_keeps_key_order() {
        let (routing, unified) = RenderedDocuments::render(&plan(), &OutputConfig::default())
            .to_yaml()
            .unwrap();
        let providers = routing.find("providers:").unwrap();
        let groups = routing.find("\ngroups:").unwrap();
        let redirects = routing.find("model_redirects:").unwrap();
        assert!(providers < groups && groups < redirects);
        assert!(unified.contains("api: openai"));

        let back: RoutingDocument = serde_yaml::from_str(&routing).unwrap();
        assert_eq!(back.providers.len(), 3);
    }

    #[test]
    fn empty_plan_renders_empty_lists() {
        let doc = render_routing(&RoutingPlan::default());
        assert!(doc.providers.is_empty());
        assert!(doc.model_redirects.is_empty());
        let yaml = serde_yaml::to_string(&doc).unwrap();
        assert!(yaml.contains("providers: []"));
    }
}
