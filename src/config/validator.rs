//! Configuration validation

use super::cli::ExecutionMode;
use super::*;
use crate::graph::UNREACHABLE;
use anyhow::Result;

/// Hard cap on participants: each one is a thread (standalone) or a process
/// with N-1 sockets (rank mode), so this is already far beyond useful sizes.
const MAX_NODES: usize = 1024;

/// Validate the complete configuration for the chosen mode
pub fn validate_config(config: &Config, mode: ExecutionMode) -> Result<()> {
    validate_graph(&config.graph)?;

    if mode == ExecutionMode::Rank {
        validate_mesh(&config.mesh, config.graph.nodes)?;
    }

    Ok(())
}

/// Validate graph fixture parameters
pub fn validate_graph(graph: &GraphConfig) -> Result<()> {
    if graph.nodes == 0 {
        anyhow::bail!("nodes must be at least 1");
    }
    if graph.nodes > MAX_NODES {
        anyhow::bail!("nodes must be at most {}, got {}", MAX_NODES, graph.nodes);
    }
    if graph.max_weight == 0 {
        anyhow::bail!("max_weight must be at least 1");
    }
    if graph.max_weight == UNREACHABLE {
        anyhow::bail!("max_weight collides with the unreachable sentinel");
    }
    if !graph.unreachable_probability.is_finite()
        || !(0.0..=1.0).contains(&graph.unreachable_probability)
    {
        anyhow::bail!(
            "unreachable_probability must be between 0.0 and 1.0, got {}",
            graph.unreachable_probability
        );
    }

    Ok(())
}

/// Validate mesh parameters (rank mode)
///
/// The participant-count precondition lives here: the host list must name
/// exactly one address per graph node, and this process's rank must fall
/// inside it. Refusing before any connection is made keeps the abort uniform.
pub fn validate_mesh(mesh: &MeshConfig, nodes: usize) -> Result<()> {
    let rank = match mesh.rank {
        Some(rank) => rank,
        None => anyhow::bail!("Rank mode requires a rank"),
    };

    if mesh.hosts.is_empty() {
        anyhow::bail!("Rank mode requires a host list");
    }
    if mesh.hosts.len() != nodes {
        anyhow::bail!(
            "participant count mismatch: {} hosts listed for a {}-node graph",
            mesh.hosts.len(),
            nodes
        );
    }
    if rank >= mesh.hosts.len() {
        anyhow::bail!(
            "rank {} out of range for {} participants",
            rank,
            mesh.hosts.len()
        );
    }

    for (i, host) in mesh.hosts.iter().enumerate() {
        let port = host.rsplit(':').next().and_then(|p| p.parse::<u16>().ok());
        if port.is_none() {
            anyhow::bail!("host entry {} ('{}') has no usable port", i, host);
        }
    }

    if mesh.connect_timeout_secs == 0 {
        anyhow::bail!("connect_timeout_secs must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank_config(nodes: usize, hosts: Vec<&str>, rank: usize) -> Config {
        let mut config = Config::default();
        config.graph.nodes = nodes;
        config.mesh.hosts = hosts.into_iter().map(String::from).collect();
        config.mesh.rank = Some(rank);
        config
    }

    #[test]
    fn test_valid_defaults() {
        let config = Config::default();
        assert!(validate_config(&config, ExecutionMode::Standalone).is_ok());
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let mut config = Config::default();
        config.graph.nodes = 0;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());
    }

    #[test]
    fn test_probability_out_of_range() {
        let mut config = Config::default();
        config.graph.unreachable_probability = 1.5;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());

        config.graph.unreachable_probability = f64::NAN;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());
    }

    #[test]
    fn test_max_weight_sentinel_collision() {
        let mut config = Config::default();
        config.graph.max_weight = UNREACHABLE;
        assert!(validate_config(&config, ExecutionMode::Standalone).is_err());
    }

    #[test]
    fn test_mesh_host_count_must_match_nodes() {
        let config = rank_config(3, vec!["a:1", "b:2"], 0);
        let err = validate_config(&config, ExecutionMode::Rank).unwrap_err();
        assert!(err.to_string().contains("participant count mismatch"));

        let config = rank_config(2, vec!["a:1", "b:2"], 0);
        assert!(validate_config(&config, ExecutionMode::Rank).is_ok());
    }

    #[test]
    fn test_mesh_rank_in_range() {
        let config = rank_config(2, vec!["a:1", "b:2"], 2);
        assert!(validate_config(&config, ExecutionMode::Rank).is_err());
    }

    #[test]
    fn test_mesh_host_needs_port() {
        let config = rank_config(2, vec!["a:1", "b"], 0);
        assert!(validate_config(&config, ExecutionMode::Rank).is_err());
    }
}
