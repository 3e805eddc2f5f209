//! Model name canonicalization.
//!
//! Providers report the same model under many spellings
//! (`openai/gpt-4-20240620`, `GPT-4-latest`, ...). The [`Canonicalizer`]
//! reduces them to one canonical form so models from different providers can
//! be grouped under a single unified name.
//!
//! Pipeline, in order:
//! 1. trim surrounding whitespace
//! 2. keep only the part after the last `/` (drops `openai/`-style prefixes)
//! 3. apply each suffix rule (case-insensitive, anchored at the end)
//! 4. lowercase
//! 5. collapse `-` runs, trim leading/trailing `-`
//! 6. collapse whitespace runs to one space
//!
//! A single pass is not idempotent (`x-20240101-preview` only exposes its
//! date suffix after `-preview` is gone), so the pipeline is repeated until
//! the output stops changing.

use regex::Regex;

use crate::config::NormalizationRule;
use crate::error::{Error, Result};

/// Consecutive passes allowed to change the name without shortening it.
/// Passes that shorten the name are always allowed, so any rule set that
/// only deletes text runs to a fixpoint. The budget stops custom rules whose
/// replacements feed each other.
const MAX_STALLED_PASSES: usize = 16;

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: Regex,
    replacement: String,
}

/// Ordered suffix-rule pipeline turning raw model names into canonical ones.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    rules: Vec<CompiledRule>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        // The built-in rules are known-good patterns.
        Self::from_rules(&NormalizationRule::defaults())
            .unwrap_or_else(|_| Self { rules: Vec::new() })
    }
}

impl Canonicalizer {
    /// Compile a rule list. Every pattern is made case-insensitive and
    /// anchored at the end of the string.
    pub fn from_rules(rules: &[NormalizationRule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (i, rule) in rules.iter().enumerate() {
            let body = strip_end_anchor(&rule.pattern);
            let pattern = Regex::new(&format!("(?i)(?:{body})$")).map_err(|e| {
                Error::Config(format!(
                    "normalization.rules[{i}]: invalid pattern {:?}: {e}",
                    rule.pattern
                ))
            })?;
            compiled.push(CompiledRule {
                pattern,
                replacement: rule.replacement.clone(),
            });
        }
        Ok(Self { rules: compiled })
    }

    /// Canonicalize a raw model name. Total: empty input gives empty output.
    pub fn canonicalize(&self, raw: &str) -> String {
        let mut current = raw.to_string();
        let mut stalled = 0;
        loop {
            let next = self.single_pass(&current);
            if next == current {
                return current;
            }
            if next.len() < current.len() {
                stalled = 0;
            } else {
                stalled += 1;
                if stalled > MAX_STALLED_PASSES {
                    return next;
                }
            }
            current = next;
        }
    }

    /// Canonicalize many names, keeping input order.
    pub fn batch_canonicalize<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Vec<(String, String)> {
        names
            .into_iter()
            .map(|n| (n.to_string(), self.canonicalize(n)))
            .collect()
    }

    fn single_pass(&self, input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let mut name = match trimmed.rfind('/') {
            Some(pos) => trimmed[pos + 1..].to_string(),
            None => trimmed.to_string(),
        };

        for rule in &self.rules {
            name = rule
                .pattern
                .replace(&name, rule.replacement.as_str())
                .into_owned();
        }

        let lowered = name.to_lowercase();
        let dashed = collapse_dashes(&lowered);
        dashed.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Remove a trailing unescaped `$` so the rule can be re-anchored uniformly.
fn strip_end_anchor(pattern: &str) -> &str {
    match pattern.strip_suffix('$') {
        Some(rest) if !rest.ends_with('\\') => rest,
        _ => pattern,
    }
}

fn collapse_dashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_dash = false;
    for c in s.chars() {
        if c == '-' {
            if !prev_dash {
                out.push(c);
            }
            prev_dash = true;
        } else {
            out.push(c);
            prev_dash = false;
        }
    }
    out.trim_matches('-').to_string()
}

/// Canonicalize with the built-in rule set.
pub fn canonicalize(raw: &str) -> String {
    Canonicalizer::default().canonicalize(raw)
}

/// The namespace prefix of a model name, if any (`openai/gpt-4` → `openai`).
pub fn provider_prefix(name: &str) -> Option<&str> {
    let (prefix, _) = name.split_once('/')?;
    Some(prefix)
}

/// Turn a free-form provider name into an identifier-safe slug.
pub fn sanitize_provider_name(name: &str) -> String {
    let replaced: String = name
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    collapse_dashes(&replaced)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_namespace_and_date_suffix() {
        assert_eq!(canonicalize("openai/gpt-4-20240620"), "gpt-4");
    }

    #[test]
    fn strips_preview_case_insensitively() {
        assert_eq!(canonicalize("anthropic/Claude-3-Opus-Preview"), "claude-3-opus");
    }

    #[test]
    fn strips_latest() {
        assert_eq!(canonicalize("gpt-4-latest"), "gpt-4");
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert_eq!(canonicalize(""), "");
        assert_eq!(canonicalize("   "), "");
        assert_eq!(canonicalize("openai/"), "");
    }

    #[test]
    fn strips_iso_date_and_year() {
        assert_eq!(canonicalize("gpt-4o-2024-08-06"), "gpt-4o");
        assert_eq!(canonicalize("claude-instant-2023"), "claude-instant");
    }

    #[test]
    fn four_digit_suffix_is_treated_as_a_year() {
        assert_eq!(canonicalize("gpt-3.5-turbo-0125"), "gpt-3.5-turbo");
        assert_eq!(canonicalize("llama-3-70b"), "llama-3-70b");
        assert_eq!(canonicalize("gpt-4-32k"), "gpt-4-32k");
    }

    #[test]
    fn keeps_only_last_path_segment() {
        assert_eq!(
            canonicalize("accounts/fireworks/models/Llama-3-8B"),
            "llama-3-8b"
        );
    }

    #[test]
    fn collapses_dashes_and_whitespace() {
        assert_eq!(canonicalize("--My--Model--"), "my-model");
        assert_eq!(canonicalize("  big   model \t v2 "), "big model v2");
    }

    #[test]
    fn date_hidden_behind_preview_is_stripped() {
        assert_eq!(canonicalize("o1-20240912-preview"), "o1");
    }

    #[test]
    fn idempotent_over_varied_inputs() {
        let c = Canonicalizer::default();
        let inputs = [
            "openai/gpt-4-20240620",
            "anthropic/Claude-3-Opus-Preview",
            "gpt-4-latest",
            "",
            "x-20240101-preview",
            "model-2024-latest-preview",
            "A/B/C--D--2024",
            "  spaced   name - 2023 ",
            "gemini-1.5-pro-latest-20240101",
            "-leading-and-trailing-",
            "UPPER-CASE-PREVIEW-LATEST",
            "qwen/qwen2.5-72b-instruct",
            "deepseek-chat-2024-12-01-preview",
            "weird - - name",
        ];
        for input in inputs {
            let once = c.canonicalize(input);
            let twice = c.canonicalize(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn long_suffix_chains_reach_a_fixpoint() {
        let c = Canonicalizer::default();
        let pieces = ["-2024", "-preview", "-latest", "-20240101", "-2024-06-30"];
        for n in 0..64 {
            let repeated = format!("m{}", "-2024".repeat(n));
            assert_eq!(c.canonicalize(&repeated), "m", "{n} year suffixes");

            let mixed: String = std::iter::once("vendor/M".to_string())
                .chain((0..n).map(|i| pieces[i % pieces.len()].to_uppercase()))
                .collect();
            let once = c.canonicalize(&mixed);
            assert_eq!(once, "m", "mixed chain of {n}");
            assert_eq!(c.canonicalize(&once), once);
        }
    }

    #[test]
    fn growing_custom_rules_still_terminate() {
        let c = Canonicalizer::from_rules(&[NormalizationRule {
            pattern: "-x".into(),
            replacement: "-x-x".into(),
        }])
        .unwrap();
        let out = c.canonicalize("model-x");
        assert!(out.starts_with("model-x"));
    }

    #[test]
    fn custom_rules_extend_the_pipeline() {
        let mut rules = NormalizationRule::defaults();
        rules.push(NormalizationRule {
            pattern: r"-instruct".into(),
            replacement: String::new(),
        });
        let c = Canonicalizer::from_rules(&rules).unwrap();
        assert_eq!(c.canonicalize("qwen/Qwen2.5-72B-Instruct"), "qwen2.5-72b");
    }

    #[test]
    fn custom_rules_are_end_anchored() {
        let rules = vec![NormalizationRule {
            pattern: "-beta".into(),
            replacement: String::new(),
        }];
        let c = Canonicalizer::from_rules(&rules).unwrap();
        assert_eq!(c.canonicalize("model-beta-large"), "model-beta-large");
        assert_eq!(c.canonicalize("model-large-beta"), "model-large");
    }

    #[test]
    fn invalid_custom_rule_is_config_error() {
        let rules = vec![NormalizationRule {
            pattern: "(unclosed".into(),
            replacement: String::new(),
        }];
        let err = Canonicalizer::from_rules(&rules).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("normalization.rules[0]"));
    }

    #[test]
    fn batch_keeps_order() {
        let c = Canonicalizer::default();
        let out = c.batch_canonicalize(["b/GPT-4-latest", "a-2024"]);
        assert_eq!(
            out,
            vec![
                ("b/GPT-4-latest".to_string(), "gpt-4".to_string()),
                ("a-2024".to_string(), "a".to_string()),
            ]
        );
    }

    #[test]
    fn provider_prefix_extraction() {
        assert_eq!(provider_prefix("openai/gpt-4"), Some("openai"));
        assert_eq!(provider_prefix("gpt-4"), None);
    }

    #[test]
    fn sanitize_provider_names() {
        assert_eq!(sanitize_provider_name("My Provider (EU)"), "my-provider-eu");
        assert_eq!(sanitize_provider_name("open_router"), "open_router");
    }
}
