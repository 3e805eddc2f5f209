use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model name normalization rules
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Suffix rules applied in order. Replacing the list replaces the
    /// defaults entirely.
    #[serde(default = "NormalizationRule::defaults")]
    pub rules: Vec<NormalizationRule>,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            rules: NormalizationRule::defaults(),
        }
    }
}

/// A `(pattern, replacement)` pair. The pattern is matched
/// case-insensitively against the end of the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl NormalizationRule {
    /// Dated snapshots first, then channel suffixes, then bare years.
    /// A bare-year strip must run after the date strips or it would eat the
    /// tail of an 8-digit date.
    pub fn defaults() -> Vec<NormalizationRule> {
        [
            r"-\d{8}$",
            r"-\d{4}-\d{2}-\d{2}$",
            r"-preview$",
            r"-latest$",
            r"-\d{4}$",
        ]
        .into_iter()
        .map(|pattern| NormalizationRule {
            pattern: pattern.into(),
            replacement: String::new(),
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_keeps_default_rules() {
        let cfg: NormalizationConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.rules.len(), 5);
        assert_eq!(cfg.rules[0].pattern, r"-\d{8}$");
    }

    #[test]
    fn custom_rules_replace_defaults() {
        let toml_str = r#"
            [[rules]]
            pattern = "-instruct$"
        "#;
        let cfg: NormalizationConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.rules.len(), 1);
        assert_eq!(cfg.rules[0].replacement, "");
    }
}
