//! `uniload config validate` and `uniload config show`.

use ul_domain::config::{Config, ConfigError, ConfigSeverity};

/// Print every config issue followed by a one-line tally. Returns `false`
/// when at least one issue is an error.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();
    print!("{}", render_issues(&issues, config_path));
    !issues.iter().any(|i| i.severity == ConfigSeverity::Error)
}

fn render_issues(issues: &[ConfigError], config_path: &str) -> String {
    if issues.is_empty() {
        return format!("Config OK ({config_path})\n");
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    let mut out: String = issues.iter().map(|i| format!("{i}\n")).collect();
    out.push_str(&format!(
        "\n{errors} error(s), {} warning(s) in {config_path}\n",
        issues.len() - errors
    ));
    out
}

/// The resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) -> anyhow::Result<String> {
    toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("serializing config: {e}"))
}
