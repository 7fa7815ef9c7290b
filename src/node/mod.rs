//! Distance-vector participant
//!
//! One [`DistanceVectorNode`] runs per graph node. It owns exactly one row of
//! the adjacency matrix (its direct edge costs) and a mutable distance vector,
//! and converges through N-1 rounds of pairwise exchange:
//!
//! ```text
//! INITIALIZED -> EXCHANGING (rounds 0..N-2) -> CONVERGED
//! ```
//!
//! Each round visits every directly connected peer in ascending rank order,
//! sends the full current vector, blocks on the peer's vector, and relaxes
//! every entry with the strict rule
//! `peer[j] != UNREACHABLE && distances[i] + peer[j] < distances[j]`.
//!
//! N-1 rounds is the classical distributed Bellman-Ford bound: a shortest path
//! between any two of N nodes uses at most N-1 edges, so N-1 full rounds are
//! sufficient for every vector to reach its true value (all weights here are
//! positive, so there are no negative cycles to worry about).
//!
//! Relaxation reads the live `distances[i]` value, so exchanges with
//! lower-ranked peers earlier in the same round are already visible. This
//! makes per-round behavior order-dependent, but values only ever move down
//! toward the true cost, so it can only accelerate convergence.

use crate::graph::{AdjacencyMatrix, Weight, UNREACHABLE};
use crate::transport::{ExchangeTransport, TransportError};

/// Lifecycle of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Vector initialized from the matrix row, no exchange yet.
    Initialized,
    /// Running the exchange loop.
    Exchanging { round: usize },
    /// All rounds complete; the vector is final.
    Converged,
}

/// One participant in the distance-vector computation.
pub struct DistanceVectorNode {
    rank: usize,
    matrix: AdjacencyMatrix,
    distances: Vec<Weight>,
    state: NodeState,
}

impl DistanceVectorNode {
    /// Create a participant for `rank`, seeding its vector from the matrix row.
    pub fn new(rank: usize, matrix: AdjacencyMatrix) -> Result<Self, TransportError> {
        if rank >= matrix.n() {
            return Err(TransportError::Precondition(format!(
                "rank {} out of range for a {}-node graph",
                rank,
                matrix.n()
            )));
        }
        let distances = matrix.row(rank).to_vec();
        Ok(Self {
            rank,
            matrix,
            distances,
            state: NodeState::Initialized,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Current best known costs from this node to every node.
    pub fn distances(&self) -> &[Weight] {
        &self.distances
    }

    /// Run all N-1 exchange rounds to convergence.
    ///
    /// Fails fast (before any exchange) if the transport's group does not
    /// match the matrix this node was built from; that mismatch would leave
    /// peers blocking forever, so it must never reach the exchange loop.
    pub fn run<T: ExchangeTransport>(&mut self, transport: &mut T) -> Result<(), TransportError> {
        let n = self.matrix.n();

        if transport.rank() != self.rank {
            return Err(TransportError::Precondition(format!(
                "node rank {} does not match transport rank {}",
                self.rank,
                transport.rank()
            )));
        }
        if transport.size() != n {
            return Err(TransportError::Precondition(format!(
                "participant count mismatch: transport has {} participants, graph has {} nodes",
                transport.size(),
                n
            )));
        }

        for round in 0..n.saturating_sub(1) {
            self.state = NodeState::Exchanging { round };

            for peer in 0..n {
                // Exchange only happens across direct links.
                if peer == self.rank || self.matrix.get(self.rank, peer) == UNREACHABLE {
                    continue;
                }

                transport.send(&self.distances, peer)?;
                let peer_distances = transport.receive(peer)?;

                if peer_distances.len() != n {
                    return Err(TransportError::Protocol(format!(
                        "rank {} sent a vector of length {}, expected {}",
                        peer,
                        peer_distances.len(),
                        n
                    )));
                }

                self.relax(peer, &peer_distances);
            }
        }

        self.state = NodeState::Converged;
        Ok(())
    }

    /// Apply the relaxation rule for every target reachable through `via`.
    fn relax(&mut self, via: usize, peer_distances: &[Weight]) {
        for j in 0..peer_distances.len() {
            if peer_distances[j] == UNREACHABLE {
                continue;
            }
            // distances[via] is finite here: it started at the direct edge
            // cost and only ever decreases. Saturating keeps the sentinel
            // unreachable by arithmetic regardless.
            let candidate = self.distances[via].saturating_add(peer_distances[j]);
            if candidate < self.distances[j] {
                self.distances[j] = candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::channel::build_mesh;
    use std::thread;

    /// Run the full protocol over a channel mesh and return all final vectors.
    fn run_protocol(matrix: &AdjacencyMatrix) -> Vec<Vec<Weight>> {
        let n = matrix.n();
        let mesh = build_mesh(n);

        let handles: Vec<_> = mesh
            .into_iter()
            .map(|mut ep| {
                let matrix = matrix.clone();
                thread::spawn(move || {
                    let mut node = DistanceVectorNode::new(ep.rank(), matrix).unwrap();
                    node.run(&mut ep).unwrap();
                    assert_eq!(node.state(), NodeState::Converged);
                    node.distances().to_vec()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_initial_vector_is_matrix_row() {
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 5, UNREACHABLE],
            vec![5, 0, 2],
            vec![UNREACHABLE, 2, 0],
        ])
        .unwrap();

        let node = DistanceVectorNode::new(1, matrix).unwrap();
        assert_eq!(node.state(), NodeState::Initialized);
        assert_eq!(node.distances(), &[5, 0, 2]);
    }

    #[test]
    fn test_rank_out_of_range() {
        let matrix = AdjacencyMatrix::from_rows(&[vec![0, 1], vec![1, 0]]).unwrap();
        assert!(DistanceVectorNode::new(2, matrix).is_err());
    }

    #[test]
    fn test_worked_four_node_example() {
        // 0 -1- 1 -2- 2 -1- 3, plus a direct 0-3 edge of cost 4. The indirect
        // 0->1->2->3 path also costs 4; the strict `<` rule keeps whichever
        // was discovered first, and either way the minimum is 4.
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 1, UNREACHABLE, 4],
            vec![1, 0, 2, UNREACHABLE],
            vec![UNREACHABLE, 2, 0, 1],
            vec![4, UNREACHABLE, 1, 0],
        ])
        .unwrap();

        let vectors = run_protocol(&matrix);
        assert_eq!(vectors[0], vec![0, 1, 3, 4]);
        assert_eq!(vectors[1], vec![1, 0, 2, 3]);
        assert_eq!(vectors[2], vec![3, 2, 0, 1]);
        assert_eq!(vectors[3], vec![4, 3, 1, 0]);
    }

    #[test]
    fn test_disconnected_pair_stays_unreachable() {
        // Two components: {0, 1} and {2}.
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 3, UNREACHABLE],
            vec![3, 0, UNREACHABLE],
            vec![UNREACHABLE, UNREACHABLE, 0],
        ])
        .unwrap();

        let vectors = run_protocol(&matrix);
        assert_eq!(vectors[0], vec![0, 3, UNREACHABLE]);
        assert_eq!(vectors[1], vec![3, 0, UNREACHABLE]);
        assert_eq!(vectors[2], vec![UNREACHABLE, UNREACHABLE, 0]);
    }

    #[test]
    fn test_single_node_converges_immediately() {
        let matrix = AdjacencyMatrix::from_rows(&[vec![0]]).unwrap();
        let mut mesh = build_mesh(1);
        let mut ep = mesh.pop().unwrap();

        let mut node = DistanceVectorNode::new(0, matrix).unwrap();
        node.run(&mut ep).unwrap();

        assert_eq!(node.state(), NodeState::Converged);
        assert_eq!(node.distances(), &[0]);
    }

    #[test]
    fn test_transport_size_mismatch_fails_before_exchange() {
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 1, 2],
            vec![1, 0, 3],
            vec![2, 3, 0],
        ])
        .unwrap();

        // Transport group of 2 for a 3-node graph.
        let mut mesh = build_mesh(2);
        let mut ep = mesh.remove(0);

        let mut node = DistanceVectorNode::new(0, matrix).unwrap();
        match node.run(&mut ep) {
            Err(TransportError::Precondition(msg)) => {
                assert!(msg.contains("participant count mismatch"), "got: {}", msg)
            }
            other => panic!("expected precondition failure, got {:?}", other.map(|_| ())),
        }
        assert_eq!(node.state(), NodeState::Initialized);
    }

    #[test]
    fn test_monotonicity_across_rounds() {
        // Chain 0-1-2-3-4 with unit weights: node 0 learns longer targets in
        // later rounds, and no entry ever increases.
        let u = UNREACHABLE;
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 1, u, u, u],
            vec![1, 0, 1, u, u],
            vec![u, 1, 0, 1, u],
            vec![u, u, 1, 0, 1],
            vec![u, u, u, 1, 0],
        ])
        .unwrap();

        let n = matrix.n();
        let mesh = build_mesh(n);

        let handles: Vec<_> = mesh
            .into_iter()
            .map(|mut ep| {
                let matrix = matrix.clone();
                thread::spawn(move || -> Vec<Vec<Weight>> {
                    // Drive the rounds by hand to snapshot between them.
                    let rank = ep.rank();
                    let mut node = DistanceVectorNode::new(rank, matrix.clone()).unwrap();
                    let mut snapshots = vec![node.distances().to_vec()];
                    for _ in 0..n - 1 {
                        for peer in 0..n {
                            if peer == rank || matrix.get(rank, peer) == UNREACHABLE {
                                continue;
                            }
                            ep.send(node.distances(), peer).unwrap();
                            let peer_distances = ep.receive(peer).unwrap();
                            node.relax(peer, &peer_distances);
                        }
                        snapshots.push(node.distances().to_vec());
                    }
                    snapshots
                })
            })
            .collect();

        let all_snapshots: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for snapshots in &all_snapshots {
            for w in snapshots.windows(2) {
                for j in 0..n {
                    assert!(w[1][j] <= w[0][j], "distance increased across a round");
                }
            }
        }
        // Node 0 reaches node 4 at cost 4 by the end.
        assert_eq!(all_snapshots[0].last().unwrap()[4], 4);
    }
}
