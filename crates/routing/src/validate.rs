//! Pre-write validation of routing plans, and structural validation of
//! externally supplied documents.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use ul_domain::error::{Error, Result};

use crate::builder::RoutingPlan;

/// Check a plan before anything is written. All problems are collected and
/// reported in one [`Error::Validation`].
pub fn validate_plan(plan: &RoutingPlan) -> Result<()> {
    let mut errors = Vec::new();
    let mut unit_ids: HashSet<&str> = HashSet::new();

    for (i, u) in plan.units.iter().enumerate() {
        let label = if u.id.is_empty() {
            format!("routing unit #{i}")
        } else {
            format!("routing unit '{}'", u.id)
        };
        if u.id.trim().is_empty() {
            errors.push(format!("{label}: name is empty"));
        } else if !unit_ids.insert(u.id.as_str()) {
            errors.push(format!("{label}: duplicate name"));
        }
        if u.base_url.trim().is_empty() {
            errors.push(format!("{label}: base_url is empty"));
        }
        if u.api_key.trim().is_empty() {
            errors.push(format!("{label}: api_key is empty"));
        }
        if u.original_name.trim().is_empty() {
            errors.push(format!("{label}: model name is empty"));
        }
    }

    let mut group_names: HashSet<&str> = HashSet::new();
    for a in &plan.aggregates {
        if !group_names.insert(a.name.as_str()) {
            errors.push(format!("aggregate group '{}': duplicate name", a.name));
        }
        if a.members.len() < 2 {
            errors.push(format!(
                "aggregate group '{}': needs at least 2 members, has {}",
                a.name,
                a.members.len()
            ));
        }
        for m in &a.members {
            if !unit_ids.contains(m.as_str()) {
                errors.push(format!("aggregate group '{}': unknown member '{m}'", a.name));
            }
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for r in &plan.redirects {
        if !seen.insert(r.unified_name.as_str()) {
            errors.push(format!("redirect '{}': duplicate unified name", r.unified_name));
        }
        let target = r.target.as_str();
        if !unit_ids.contains(target) && !group_names.contains(target) {
            errors.push(format!(
                "redirect '{}': target '{}' does not resolve",
                r.unified_name, r.target
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::warn!(count = errors.len(), "routing plan failed validation");
        Err(Error::Validation(errors))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Untyped document validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Routing,
    Unified,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Routing => "routing",
            DocumentKind::Unified => "unified",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "routing" | "gptload" | "gpt-load" => Ok(DocumentKind::Routing),
            "unified" | "uniapi" | "uni-api" => Ok(DocumentKind::Unified),
            other => Err(format!(
                "unknown document kind '{other}' (expected 'routing' or 'unified')"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Check the structure of a document that did not come from this process.
pub fn validate_document(doc: &Value, kind: DocumentKind) -> DocumentValidation {
    let mut errors = Vec::new();

    match kind {
        DocumentKind::Routing => {
            let providers = require_list(doc, "providers", &mut errors);
            let groups = require_list(doc, "groups", &mut errors);
            require_fields(providers, "provider", &["name", "base_url", "api_key"], &mut errors);
            check_redirects(doc, providers, groups, &mut errors);
        }
        DocumentKind::Unified => {
            let providers = require_list(doc, "providers", &mut errors);
            require_fields(providers, "provider", &["provider", "base_url"], &mut errors);
        }
    }

    if !errors.is_empty() {
        tracing::warn!(kind = %kind, errors = errors.len(), "document failed validation");
    }
    DocumentValidation {
        valid: errors.is_empty(),
        errors,
    }
}

fn require_list<'a>(doc: &'a Value, key: &str, errors: &mut Vec<String>) -> &'a [Value] {
    match doc.get(key) {
        None => {
            errors.push(format!("missing '{key}' field"));
            &[]
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push(format!("'{key}' must be a list"));
            &[]
        }
    }
}

fn require_fields(items: &[Value], what: &str, fields: &[&str], errors: &mut Vec<String>) {
    for (idx, item) in items.iter().enumerate() {
        if !item.is_object() {
            errors.push(format!("{what} {idx}: must be a mapping"));
            continue;
        }
        for field in fields {
            if item.get(*field).is_none() {
                errors.push(format!("{what} {idx}: missing '{field}' field"));
            }
        }
    }
}

/// Redirect targets in a routing document must name a provider entry, a
/// group or an aggregate group.
fn check_redirects(doc: &Value, providers: &[Value], groups: &[Value], errors: &mut Vec<String>) {
    let Some(redirects) = doc.get("model_redirects") else {
        return;
    };
    let Some(redirects) = redirects.as_object() else {
        errors.push("'model_redirects' must be a mapping".into());
        return;
    };

    let aggregates = doc
        .get("aggregate_groups")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let known: HashSet<&str> = providers
        .iter()
        .chain(groups)
        .chain(aggregates)
        .filter_map(|v| v.get("name").and_then(Value::as_str))
        .collect();

    for (name, target) in redirects {
        match target.as_str() {
            Some(t) if known.contains(t) => {}
            Some(t) => errors.push(format!("redirect '{name}': target '{t}' does not resolve")),
            None => errors.push(format!("redirect '{name}': target must be a string")),
        }
    }
}
