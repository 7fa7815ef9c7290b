//! TOML configuration file parsing

use super::*;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Load the effective configuration: TOML file if given, defaults otherwise,
/// with CLI flags overriding either.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, base)
}

/// Merge CLI arguments with a base configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Override graph settings
    if let Some(nodes) = cli.nodes {
        config.graph.nodes = nodes;
    }
    if let Some(max_weight) = cli.max_weight {
        config.graph.max_weight = max_weight;
    }
    if let Some(prob) = cli.unreachable_prob {
        config.graph.unreachable_probability = prob;
    }
    if let Some(seed) = cli.seed {
        config.graph.seed = Some(seed);
    }

    // Override mesh settings
    if let Some(rank) = cli.rank {
        config.mesh.rank = Some(rank);
    }
    if cli.worker_port != default_worker_port() {
        config.mesh.worker_port = cli.worker_port;
    }
    if let Some(timeout) = cli.connect_timeout {
        config.mesh.connect_timeout_secs = timeout;
    }
    if let Some(ref host_list) = cli.host_list {
        config.mesh.hosts = parse_host_list(host_list, config.mesh.worker_port);
    } else if let Some(ref clients_file) = cli.clients_file {
        let contents = fs::read_to_string(clients_file)
            .with_context(|| format!("Failed to read clients file: {}", clients_file.display()))?;
        config.mesh.hosts = parse_clients_file(&contents, config.mesh.worker_port);
    } else {
        // Normalize file-sourced entries too.
        config.mesh.hosts = config
            .mesh
            .hosts
            .iter()
            .map(|h| with_default_port(h, config.mesh.worker_port))
            .collect();
    }

    // Override output settings
    if let Some(ref path) = cli.json_output {
        config.output.json_output = Some(path.clone());
    }
    if cli.quiet {
        config.output.quiet = true;
    }

    // Override runtime settings
    if cli.verify {
        config.runtime.verify = true;
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    Ok(config)
}

/// Parse a comma-separated host list, appending the default port where missing
pub fn parse_host_list(host_list: &str, default_port: u16) -> Vec<String> {
    host_list
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|addr| with_default_port(addr, default_port))
        .collect()
}

/// Parse a clients file: one host per line, `#` comments and blanks skipped
pub fn parse_clients_file(contents: &str, default_port: u16) -> Vec<String> {
    contents
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|addr| with_default_port(addr, default_port))
        .collect()
}

fn with_default_port(addr: &str, default_port: u16) -> String {
    if addr.contains(':') {
        addr.to_string()
    } else {
        format!("{}:{}", addr, default_port)
    }
}
