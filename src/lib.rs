//! meshpath - Distributed all-pairs shortest path computation
//!
//! meshpath computes all-pairs shortest-path distances over a small weighted
//! graph with a distributed distance-vector protocol: one participant per graph
//! node, each holding only its own row of the adjacency matrix, converging
//! through N-1 rounds of pairwise vector exchange and local relaxation.
//!
//! # Architecture
//!
//! - **Pluggable transports**: in-process channel mesh or multi-process TCP mesh
//! - **Round-based exchange**: classical distributed Bellman-Ford convergence bound
//! - **Reproducible fixtures**: seeded random graph generation
//! - **Built-in verification**: centralized Dijkstra cross-check of the result

pub mod collector;
pub mod config;
pub mod graph;
pub mod node;
pub mod output;
pub mod runner;
pub mod transport;
pub mod util;

// Re-export commonly used types
pub use config::Config;
pub use graph::{AdjacencyMatrix, Weight, UNREACHABLE};
pub use transport::ExchangeTransport;

/// Result type used throughout meshpath
pub type Result<T> = anyhow::Result<T>;
