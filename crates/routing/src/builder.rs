//! Aggregation & routing plan construction.
//!
//! Every enabled `(provider, model)` pair becomes its own routing unit.
//! Units sharing a unified name are folded back together: one unit is
//! addressed directly, two or more get an `Aggr-{unified}` round-robin group.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use ul_domain::error::Result;
use ul_domain::records::{ModelRecord, Provider};
use ul_store::{ModelFilter, ModelRepository, ProviderRepository};

pub const AGGREGATE_PREFIX: &str = "Aggr-";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Plan types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One provider+model pairing, addressable on its own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingUnit {
    /// `{provider.name}-{idx}`.
    pub id: String,
    pub provider_id: String,
    pub model_id: String,
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub original_name: String,
    pub unified_name: String,
}

impl RoutingUnit {
    /// Name of the single-unit group wrapping this unit in the routing
    /// document.
    pub fn group_name(&self) -> String {
        format!("{}-{}", self.id, self.unified_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalance {
    RoundRobin,
}

impl LoadBalance {
    pub fn as_str(self) -> &'static str {
        match self {
            LoadBalance::RoundRobin => "round_robin",
        }
    }
}

/// Two or more units serving the same unified name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateGroup {
    pub name: String,
    pub unified_name: String,
    /// Member unit ids, in unit order.
    pub members: Vec<String>,
    pub load_balance: LoadBalance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    pub unified_name: String,
    /// An aggregate group name, or the sole unit id.
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoutingPlan {
    pub units: Vec<RoutingUnit>,
    pub aggregates: Vec<AggregateGroup>,
    /// One entry per unified name, in first-seen order.
    pub redirects: Vec<Redirect>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Views for the admin API
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize)]
pub struct SplitEntry {
    pub unit_id: String,
    pub unified_name: String,
    pub original_name: String,
    pub model_id: String,
}

/// The units derived from one provider.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSplit {
    pub provider_id: String,
    pub units: Vec<SplitEntry>,
}

/// Everything serving one unified name.
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedGroup {
    pub unified_name: String,
    pub target: String,
    pub aggregated: bool,
    pub units: Vec<String>,
}

impl RoutingPlan {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn unit(&self, id: &str) -> Option<&RoutingUnit> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn target_of(&self, unified_name: &str) -> Option<&str> {
        self.redirects
            .iter()
            .find(|r| r.unified_name == unified_name)
            .map(|r| r.target.as_str())
    }

    /// Units grouped by provider, providers in plan order.
    pub fn splits(&self) -> Vec<ProviderSplit> {
        let mut out: Vec<ProviderSplit> = Vec::new();
        for u in &self.units {
            let entry = SplitEntry {
                unit_id: u.id.clone(),
                unified_name: u.unified_name.clone(),
                original_name: u.original_name.clone(),
                model_id: u.model_id.clone(),
            };
            match out.last_mut() {
                Some(split) if split.provider_id == u.provider_id => split.units.push(entry),
                _ => out.push(ProviderSplit {
                    provider_id: u.provider_id.clone(),
                    units: vec![entry],
                }),
            }
        }
        out
    }

    /// One entry per unified name, redirect order.
    pub fn groups_by_name(&self) -> Vec<UnifiedGroup> {
        self.redirects
            .iter()
            .map(|r| {
                let units: Vec<String> = self
                    .units
                    .iter()
                    .filter(|u| u.unified_name == r.unified_name)
                    .map(|u| u.id.clone())
                    .collect();
                UnifiedGroup {
                    unified_name: r.unified_name.clone(),
                    target: r.target.clone(),
                    aggregated: units.len() > 1,
                    units,
                }
            })
            .collect()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Construction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build a plan from a snapshot. Disabled providers and models are ignored;
/// the relative order of both slices decides unit indices and redirect
/// order. Provider priority is not consulted.
pub fn build_plan(providers: &[Provider], models: &[ModelRecord]) -> RoutingPlan {
    let mut by_provider: HashMap<&str, Vec<&ModelRecord>> = HashMap::new();
    for m in models.iter().filter(|m| m.enabled) {
        by_provider.entry(m.provider_id.as_str()).or_default().push(m);
    }

    let mut units = Vec::new();
    for provider in providers.iter().filter(|p| p.enabled) {
        let Some(provider_models) = by_provider.get(provider.id.as_str()) else {
            continue;
        };
        let base_url = provider.base_url.trim_end_matches('/').to_string();
        for (idx, model) in provider_models.iter().enumerate() {
            units.push(RoutingUnit {
                id: format!("{}-{idx}", provider.name),
                provider_id: provider.id.clone(),
                model_id: model.id.clone(),
                base_url: base_url.clone(),
                api_key: provider.api_key.clone(),
                original_name: model.original_name.clone(),
                unified_name: model.unified_name().to_string(),
            });
        }
    }

    // unified name -> member unit ids, first-seen order.
    let mut order: Vec<(&str, Vec<String>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for u in &units {
        match index.get(u.unified_name.as_str()) {
            Some(&i) => order[i].1.push(u.id.clone()),
            None => {
                index.insert(u.unified_name.as_str(), order.len());
                order.push((u.unified_name.as_str(), vec![u.id.clone()]));
            }
        }
    }

    let mut aggregates = Vec::new();
    let mut redirects = Vec::with_capacity(order.len());
    for (unified, members) in order {
        let target = if members.len() > 1 {
            let name = format!("{AGGREGATE_PREFIX}{unified}");
            aggregates.push(AggregateGroup {
                name: name.clone(),
                unified_name: unified.to_string(),
                members,
                load_balance: LoadBalance::RoundRobin,
            });
            name
        } else {
            members.into_iter().next().unwrap_or_default()
        };
        redirects.push(Redirect {
            unified_name: unified.to_string(),
            target,
        });
    }

    RoutingPlan {
        units,
        aggregates,
        redirects,
    }
}

/// Reads the store and builds a [`RoutingPlan`].
pub struct RoutingBuilder {
    providers: Arc<dyn ProviderRepository>,
    models: Arc<dyn ModelRepository>,
}

impl RoutingBuilder {
    pub fn new(providers: Arc<dyn ProviderRepository>, models: Arc<dyn ModelRepository>) -> Self {
        Self { providers, models }
    }

    pub async fn build(&self) -> Result<RoutingPlan> {
        let providers = self.providers.list_providers(true).await?;
        if providers.is_empty() {
            tracing::warn!("no enabled providers, routing plan is empty");
            return Ok(RoutingPlan::default());
        }
        let models = self.models.list_models(&ModelFilter::enabled()).await?;
        let plan = build_plan(&providers, &models);
        tracing::info!(
            units = plan.units.len(),
            aggregates = plan.aggregates.len(),
            redirects = plan.redirects.len(),
            "routing plan built"
        );
        Ok(plan)
    }
}
