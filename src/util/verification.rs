//! Result verification
//!
//! Recomputes all-pairs shortest paths centrally with per-source Dijkstra and
//! diffs the result against the matrix the distributed protocol produced.
//! Sources are independent, so the reference computation fans out across cores
//! with rayon. Used by `--verify` and by the end-to-end tests.

use crate::collector::DistanceMatrix;
use crate::graph::{AdjacencyMatrix, Weight, UNREACHABLE};
use rayon::prelude::*;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Verification result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// Every entry matches the reference distances
    Success,
    /// First mismatching entry found
    Failure {
        /// Source rank of the mismatching entry
        source: usize,
        /// Target index of the mismatching entry
        target: usize,
        /// Reference (Dijkstra) distance
        expected: Weight,
        /// Distance the protocol produced
        actual: Weight,
    },
}

/// Compute reference all-pairs distances with one Dijkstra run per source.
pub fn reference_distances(matrix: &AdjacencyMatrix) -> DistanceMatrix {
    let rows: Vec<Vec<Weight>> = (0..matrix.n())
        .into_par_iter()
        .map(|source| dijkstra(matrix, source))
        .collect();
    DistanceMatrix::from_rows(rows)
}

/// Compare a computed distance matrix against the Dijkstra reference.
pub fn verify_distances(
    matrix: &AdjacencyMatrix,
    computed: &DistanceMatrix,
) -> VerificationResult {
    let reference = reference_distances(matrix);

    for source in 0..matrix.n() {
        for target in 0..matrix.n() {
            let expected = reference.get(source, target);
            let actual = computed.get(source, target);
            if expected != actual {
                return VerificationResult::Failure {
                    source,
                    target,
                    expected,
                    actual,
                };
            }
        }
    }

    VerificationResult::Success
}

/// Single-source shortest paths over the dense adjacency matrix.
fn dijkstra(matrix: &AdjacencyMatrix, source: usize) -> Vec<Weight> {
    let n = matrix.n();
    let mut dist = vec![UNREACHABLE; n];
    dist[source] = 0;

    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0 as Weight, source)));

    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        for v in 0..n {
            if v == u {
                continue;
            }
            let w = matrix.get(u, v);
            if w == UNREACHABLE {
                continue;
            }
            let candidate = d + w;
            if candidate < dist[v] {
                dist[v] = candidate;
                heap.push(Reverse((candidate, v)));
            }
        }
    }

    dist
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dijkstra_prefers_indirect_path() {
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 1, 10],
            vec![1, 0, 2],
            vec![10, 2, 0],
        ])
        .unwrap();

        assert_eq!(dijkstra(&matrix, 0), vec![0, 1, 3]);
        assert_eq!(dijkstra(&matrix, 2), vec![3, 2, 0]);
    }

    #[test]
    fn test_dijkstra_unreachable_component() {
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 2, UNREACHABLE],
            vec![2, 0, UNREACHABLE],
            vec![UNREACHABLE, UNREACHABLE, 0],
        ])
        .unwrap();

        assert_eq!(dijkstra(&matrix, 0), vec![0, 2, UNREACHABLE]);
        assert_eq!(dijkstra(&matrix, 2), vec![UNREACHABLE, UNREACHABLE, 0]);
    }

    #[test]
    fn test_verify_success() {
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 1, 10],
            vec![1, 0, 2],
            vec![10, 2, 0],
        ])
        .unwrap();

        let computed = DistanceMatrix::from_rows(vec![
            vec![0, 1, 3],
            vec![1, 0, 2],
            vec![3, 2, 0],
        ]);

        assert_eq!(verify_distances(&matrix, &computed), VerificationResult::Success);
    }

    #[test]
    fn test_verify_reports_first_mismatch() {
        let matrix = AdjacencyMatrix::from_rows(&[
            vec![0, 1, 10],
            vec![1, 0, 2],
            vec![10, 2, 0],
        ])
        .unwrap();

        // Entry (0, 2) kept the direct cost instead of relaxing through 1.
        let computed = DistanceMatrix::from_rows(vec![
            vec![0, 1, 10],
            vec![1, 0, 2],
            vec![3, 2, 0],
        ]);

        match verify_distances(&matrix, &computed) {
            VerificationResult::Failure {
                source,
                target,
                expected,
                actual,
            } => {
                assert_eq!((source, target), (0, 2));
                assert_eq!(expected, 3);
                assert_eq!(actual, 10);
            }
            VerificationResult::Success => panic!("mismatch not detected"),
        }
    }
}
