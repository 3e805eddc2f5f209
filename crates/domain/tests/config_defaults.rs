use ul_domain::config::{Config, ConfigSeverity};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn default_config_has_no_errors() {
    let issues = Config::default().validate();
    assert!(
        issues.iter().all(|i| i.severity != ConfigSeverity::Error),
        "unexpected errors: {issues:?}"
    );
}

#[test]
fn full_file_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 9090

[store]
data_dir = "/var/lib/uniload"

[discovery]
max_concurrent = 8
max_retries = 2
backoff_factor = 1.5

[health]
enabled = false
interval_secs = 60

[output]
config_dir = "/etc/uniload"
gateway_root = "http://gpt-load:3001"

[output.unified_api]
port = 8001

[downstream]
routing_url = "http://gpt-load:3001"
unified_url = "http://uni-api:8000"

[[normalization.rules]]
pattern = "-\\d{8}$"

[[normalization.rules]]
pattern = "-instruct"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.store.data_dir.to_str(), Some("/var/lib/uniload"));
    assert_eq!(config.discovery.max_concurrent, 8);
    assert_eq!(config.discovery.max_retries, 2);
    assert!(!config.health.enabled);
    assert_eq!(config.output.unified_api.port, 8001);
    assert_eq!(config.output.unified_api.bind, "0.0.0.0");
    assert_eq!(config.downstream.unified_url, "http://uni-api:8000");
    assert_eq!(config.normalization.rules.len(), 2);
    assert!(config.validate().is_empty());
}

#[test]
fn zero_concurrency_is_an_error() {
    let toml_str = r#"
[discovery]
max_concurrent = 0
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues
        .iter()
        .any(|i| i.field == "discovery.max_concurrent" && i.severity == ConfigSeverity::Error));
}

#[test]
fn invalid_normalization_rule_is_reported() {
    let toml_str = r#"
[[normalization.rules]]
pattern = "(["
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues.iter().any(|i| i.field == "normalization.rules"));
}

#[test]
fn same_output_file_names_conflict() {
    let toml_str = r#"
[output]
routing_file = "out.yaml"
unified_file = "out.yaml"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert!(issues.iter().any(|i| i.field == "output.unified_file"));
}

#[test]
fn wildcard_cors_is_a_warning() {
    let toml_str = r#"
[server.cors]
allowed_origins = ["*"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, ConfigSeverity::Warning);
    assert!(issues[0].to_string().starts_with("[WARN] server.cors.allowed_origins"));
}
