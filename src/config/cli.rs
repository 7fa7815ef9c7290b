//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Standalone mode (default) - all participants as threads in this process
    Standalone,
    /// Rank mode - run as one participant of a multi-process TCP mesh
    Rank,
}

/// meshpath - Distributed all-pairs shortest path computation
#[derive(Parser, Debug)]
#[command(name = "meshpath")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: standalone or rank
    #[arg(long, value_enum, default_value = "standalone")]
    pub mode: ExecutionMode,

    // === Graph Options ===
    /// Number of graph nodes (= participants)
    #[arg(short = 'n', long)]
    pub nodes: Option<usize>,

    /// Upper bound for random edge weights (inclusive)
    #[arg(long)]
    pub max_weight: Option<u32>,

    /// Probability that a pair of nodes has no direct edge (0.0-1.0)
    #[arg(long)]
    pub unreachable_prob: Option<f64>,

    /// Random seed for reproducible graphs
    #[arg(long)]
    pub seed: Option<u64>,

    // === Mesh Options (rank mode) ===
    /// This process's rank in the mesh (rank mode only)
    #[arg(long)]
    pub rank: Option<usize>,

    /// Comma-separated participant addresses ordered by rank
    /// (e.g., "10.0.1.10:9999,10.0.1.11:9999")
    #[arg(long)]
    pub host_list: Option<String>,

    /// File containing participant addresses (one per line, ordered by rank)
    #[arg(long)]
    pub clients_file: Option<PathBuf>,

    /// Port appended to host entries that do not specify one
    #[arg(long, default_value = "9999")]
    pub worker_port: u16,

    /// Bootstrap connection timeout in seconds
    #[arg(long)]
    pub connect_timeout: Option<u64>,

    // === Output Options ===
    /// Write a JSON report to this path
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Suppress matrix printing
    #[arg(short = 'q', long)]
    pub quiet: bool,

    // === Runtime Options ===
    /// Cross-check the result against a centralized Dijkstra computation
    #[arg(long)]
    pub verify: bool,

    /// TOML configuration file (CLI flags override file values)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Mode-specific argument checks that clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.mode {
            ExecutionMode::Standalone => {
                if self.rank.is_some() {
                    anyhow::bail!("--rank only applies to rank mode");
                }
            }
            ExecutionMode::Rank => {
                if self.rank.is_none() {
                    anyhow::bail!("Rank mode requires --rank");
                }
                if self.host_list.is_none() && self.clients_file.is_none() && self.config.is_none()
                {
                    anyhow::bail!("Rank mode requires --host-list, --clients-file, or --config");
                }
            }
        }

        if self.host_list.is_some() && self.clients_file.is_some() {
            anyhow::bail!("--host-list and --clients-file are mutually exclusive");
        }

        Ok(())
    }
}
