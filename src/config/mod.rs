//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod toml;
pub mod validator;

use crate::graph::Weight;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub mesh: MeshConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph: GraphConfig::default(),
            mesh: MeshConfig::default(),
            output: OutputConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Graph fixture parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Number of graph nodes (= participants)
    #[serde(default = "default_nodes")]
    pub nodes: usize,
    /// Upper bound for random edge weights (inclusive)
    #[serde(default = "default_max_weight")]
    pub max_weight: Weight,
    /// Probability that an unordered pair of nodes has no direct edge
    #[serde(default = "default_unreachable_probability")]
    pub unreachable_probability: f64,
    /// Random seed for reproducible graphs
    pub seed: Option<u64>,
}

fn default_nodes() -> usize {
    7
}

fn default_max_weight() -> Weight {
    10
}

fn default_unreachable_probability() -> f64 {
    0.33
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            nodes: default_nodes(),
            max_weight: default_max_weight(),
            unreachable_probability: default_unreachable_probability(),
            seed: None,
        }
    }
}

/// Mesh configuration (rank mode)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Participant addresses ordered by rank, `host:port` each
    #[serde(default)]
    pub hosts: Vec<String>,
    /// This process's rank in the mesh
    pub rank: Option<usize>,
    /// Default port appended to host entries without one
    #[serde(default = "default_worker_port")]
    pub worker_port: u16,
    /// Bootstrap connection timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_worker_port() -> u16 {
    9999
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            hosts: Vec::new(),
            rank: None,
            worker_port: default_worker_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON report file path
    pub json_output: Option<PathBuf>,
    /// Suppress matrix printing (useful for large graphs)
    #[serde(default)]
    pub quiet: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_output: None,
            quiet: false,
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Cross-check the result against a centralized Dijkstra computation
    #[serde(default)]
    pub verify: bool,
    /// Validate configuration and exit without running
    #[serde(default)]
    pub dry_run: bool,
    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            verify: false,
            dry_run: false,
            debug: false,
        }
    }
}

// Display trait implementations

impl fmt::Display for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, weights 1..={}, unreachable_prob={}",
            self.nodes, self.max_weight, self.unreachable_probability
        )?;
        if let Some(seed) = self.seed {
            write!(f, ", seed={}", seed)?;
        }
        Ok(())
    }
}

impl fmt::Display for MeshConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hosts.is_empty() {
            write!(f, "in-process")
        } else {
            write!(f, "{} hosts", self.hosts.len())?;
            if let Some(rank) = self.rank {
                write!(f, ", rank={}", rank)?;
            }
            Ok(())
        }
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref path) = self.json_output {
            parts.push(format!("json={}", path.display()));
        }
        if self.quiet {
            parts.push("quiet".to_string());
        }
        if parts.is_empty() {
            write!(f, "text output")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

impl fmt::Display for RuntimeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.verify {
            parts.push("verify");
        }
        if self.dry_run {
            parts.push("dry_run");
        }
        if self.debug {
            parts.push("debug");
        }
        if parts.is_empty() {
            write!(f, "default")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}
