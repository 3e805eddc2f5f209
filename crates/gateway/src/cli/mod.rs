pub mod commands;
pub mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ul_routing::DocumentKind;

/// uniload: aggregates model catalogues from LLM providers and writes
/// routing configuration for the downstream gateways.
#[derive(Debug, Parser)]
#[command(name = "uniload", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the admin server (default when no subcommand is given).
    Serve,
    /// Fetch model catalogues and update the model records.
    Discover {
        /// Only refresh these provider ids (repeatable). Defaults to every
        /// enabled provider.
        #[arg(long = "provider")]
        providers: Vec<String>,
    },
    /// Probe every enabled provider once and print the results.
    Health,
    /// Build the routing plan and write both configuration documents.
    Generate {
        /// Print the rendered documents instead of writing them.
        #[arg(long)]
        dry_run: bool,
    },
    /// Check the structure of an existing configuration document.
    Validate {
        /// Document kind: routing or unified.
        #[arg(long)]
        kind: DocumentKind,
        /// Path to the YAML file.
        file: PathBuf,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `UNILOAD_CONFIG` (or
/// `config.toml` by default). Returns the parsed [`Config`] and the
/// path that was used.
///
/// [`Config`]: ul_domain::config::Config
pub fn load_config() -> anyhow::Result<(ul_domain::config::Config, String)> {
    let config_path =
        std::env::var("UNILOAD_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

/// A missing file yields the default configuration.
pub fn load_config_from(config_path: &str) -> anyhow::Result<ul_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(ul_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["uniload"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn discover_takes_repeated_providers() {
        let cli =
            Cli::try_parse_from(["uniload", "discover", "--provider", "a", "--provider", "b"])
                .unwrap();
        match cli.command {
            Some(Command::Discover { providers }) => assert_eq!(providers, vec!["a", "b"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn validate_parses_kind_aliases() {
        let cli = Cli::try_parse_from(["uniload", "validate", "--kind", "gpt-load", "x.yaml"])
            .unwrap();
        match cli.command {
            Some(Command::Validate { kind, file }) => {
                assert_eq!(kind, DocumentKind::Routing);
                assert_eq!(file, PathBuf::from("x.yaml"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["uniload", "validate", "--kind", "nope", "x.yaml"]).is_err());
    }

    #[test]
    fn generate_dry_run_flag() {
        let cli = Cli::try_parse_from(["uniload", "generate", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Generate { dry_run: true })));
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cfg = load_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        let err = load_config_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }
}
