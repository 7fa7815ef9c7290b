//! Run orchestration
//!
//! Standalone mode spawns one scoped thread per participant over an in-process
//! channel mesh; rank mode runs this process as a single participant of a TCP
//! mesh. Both drive the same sequence: broadcast the adjacency matrix from
//! rank 0, run the exchange loop, gather the converged vectors at rank 0.

use crate::collector::{self, DistanceMatrix};
use crate::config::Config;
use crate::graph::{self, AdjacencyMatrix};
use crate::node::DistanceVectorNode;
use crate::transport::channel::{build_mesh, ChannelEndpoint};
use crate::transport::socket::SocketMesh;
use crate::transport::{ExchangeTransport, TransportError};
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Result of a completed run, held by the collecting participant.
pub struct RunReport {
    /// The graph the computation ran on
    pub adjacency: AdjacencyMatrix,
    /// Converged all-pairs distances, one row per participant
    pub distances: DistanceMatrix,
    /// Number of exchange rounds executed (N-1)
    pub rounds: usize,
    /// Wall-clock time of the exchange + collection phases
    pub elapsed: Duration,
}

/// One participant's slice of the protocol: receive the matrix, converge,
/// contribute to the gather. Identical in both modes.
fn run_participant<T: ExchangeTransport>(
    transport: &mut T,
    seed_matrix: Option<AdjacencyMatrix>,
) -> Result<(AdjacencyMatrix, Option<DistanceMatrix>), TransportError> {
    let matrix = transport.broadcast(seed_matrix, 0)?;

    matrix
        .validate()
        .map_err(TransportError::Precondition)?;

    let mut node = DistanceVectorNode::new(transport.rank(), matrix.clone())?;
    node.run(transport)?;

    let collected = collector::collect(transport, node.distances(), 0)?;
    Ok((matrix, collected))
}

/// Run all participants as threads in this process.
pub fn run_standalone(config: &Config) -> Result<RunReport> {
    let n = config.graph.nodes;

    if config.runtime.debug {
        let cores = num_cpus::get();
        if n > cores {
            eprintln!(
                "DEBUG: {} participants oversubscribe {} cores; exchanges will interleave",
                n, cores
            );
        }
    }

    let matrix = graph::generate(&config.graph);
    let endpoints = build_mesh(n);
    if endpoints.len() != n {
        anyhow::bail!(
            "participant count mismatch: mesh has {} endpoints for a {}-node graph",
            endpoints.len(),
            n
        );
    }

    let start = Instant::now();
    let collected = run_threads(endpoints, &matrix)?;
    let elapsed = start.elapsed();

    let distances = collected.context("collecting rank produced no distance matrix")?;

    Ok(RunReport {
        adjacency: matrix,
        distances,
        rounds: n.saturating_sub(1),
        elapsed,
    })
}

/// Spawn one scoped thread per endpoint and reduce their results.
///
/// A failing participant drops its endpoint, which cascades as `Disconnected`
/// through the mesh; every thread then exits with an error and no partial
/// matrix is ever returned.
fn run_threads(
    endpoints: Vec<ChannelEndpoint>,
    matrix: &AdjacencyMatrix,
) -> Result<Option<DistanceMatrix>> {
    let outcome = crossbeam::thread::scope(|s| {
        let handles: Vec<_> = endpoints
            .into_iter()
            .map(|mut ep| {
                let seed_matrix = if ep.rank() == 0 {
                    Some(matrix.clone())
                } else {
                    None
                };
                s.spawn(move |_| run_participant(&mut ep, seed_matrix))
            })
            .collect();

        let mut collected = None;
        let mut first_error: Option<TransportError> = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok((_, Some(matrix)))) => collected = Some(matrix),
                Ok(Ok((_, None))) => {}
                Ok(Err(e)) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
                Err(_) => {
                    if first_error.is_none() {
                        first_error = Some(TransportError::Protocol(
                            "participant thread panicked".to_string(),
                        ));
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(collected),
        }
    })
    .map_err(|_| anyhow::anyhow!("participant thread panicked"))?;

    outcome.context("distributed computation aborted")
}

/// Run this process as one participant of a TCP mesh.
///
/// Rank 0 generates the graph and initiates the broadcast. Returns a report at
/// rank 0 and `None` on every other rank. On any failure after the mesh is up,
/// an abort is pushed to all peers before the error propagates.
pub fn run_rank(config: &Config) -> Result<Option<RunReport>> {
    let rank = config
        .mesh
        .rank
        .context("rank mode requires a configured rank")?;
    let n = config.graph.nodes;

    let mut mesh = SocketMesh::connect(
        rank,
        &config.mesh.hosts,
        Duration::from_secs(config.mesh.connect_timeout_secs),
        config.runtime.debug,
    )
    .context("failed to join mesh")?;

    let seed_matrix = if rank == 0 {
        Some(graph::generate(&config.graph))
    } else {
        None
    };

    let start = Instant::now();
    let result = run_participant(&mut mesh, seed_matrix);
    let elapsed = start.elapsed();

    match result {
        Ok((matrix, Some(distances))) => Ok(Some(RunReport {
            adjacency: matrix,
            distances,
            rounds: n.saturating_sub(1),
            elapsed,
        })),
        Ok((_, None)) => Ok(None),
        Err(e) => {
            // Take the rest of the mesh down with us before reporting.
            mesh.abort(&e.to_string());
            Err(e).context("distributed computation aborted")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::graph::UNREACHABLE;
    use crate::util::verification::{verify_distances, VerificationResult};

    fn config_with(nodes: usize, unreachable_probability: f64, seed: u64) -> Config {
        let mut config = Config::default();
        config.graph = GraphConfig {
            nodes,
            max_weight: 10,
            unreachable_probability,
            seed: Some(seed),
        };
        config
    }

    #[test]
    fn test_standalone_matches_dijkstra_reference() {
        for seed in [1, 7, 42] {
            let config = config_with(9, 0.33, seed);
            let report = run_standalone(&config).unwrap();

            assert_eq!(report.rounds, 8);
            assert_eq!(
                verify_distances(&report.adjacency, &report.distances),
                VerificationResult::Success,
                "seed {} diverged from the reference",
                seed
            );
        }
    }

    #[test]
    fn test_standalone_deterministic_for_fixed_graph() {
        let config = config_with(8, 0.4, 123);

        let first = run_standalone(&config).unwrap();
        let second = run_standalone(&config).unwrap();

        assert_eq!(first.adjacency, second.adjacency);
        assert_eq!(first.distances, second.distances);
    }

    #[test]
    fn test_standalone_sparse_graph_keeps_sentinels() {
        // High severance probability leaves isolated nodes; their entries must
        // stay at the sentinel rather than picking up phantom paths.
        let config = config_with(10, 0.9, 5);
        let report = run_standalone(&config).unwrap();

        assert_eq!(
            verify_distances(&report.adjacency, &report.distances),
            VerificationResult::Success
        );

        let has_sentinel = (0..10).any(|i| (0..10).any(|j| {
            i != j && report.distances.get(i, j) == UNREACHABLE
        }));
        assert!(has_sentinel, "seed 5 at p=0.9 should leave unreachable pairs");
    }

    #[test]
    fn test_standalone_single_node() {
        let config = config_with(1, 0.5, 9);
        let report = run_standalone(&config).unwrap();

        assert_eq!(report.rounds, 0);
        assert_eq!(report.distances.n(), 1);
        assert_eq!(report.distances.get(0, 0), 0);
    }

    #[test]
    fn test_standalone_dense_graph() {
        let config = config_with(6, 0.0, 11);
        let report = run_standalone(&config).unwrap();

        for i in 0..6 {
            for j in 0..6 {
                assert_ne!(report.distances.get(i, j), UNREACHABLE);
            }
        }
        assert_eq!(
            verify_distances(&report.adjacency, &report.distances),
            VerificationResult::Success
        );
    }
}
