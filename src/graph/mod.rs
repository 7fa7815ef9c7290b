//! Graph fixture types
//!
//! The adjacency matrix is the authoritative description of the graph. It is
//! materialized once by the rank-0 initiator, broadcast to every participant,
//! and never mutated afterwards. Each participant only ever reads its own row
//! during the exchange loop.

pub mod generate;

pub use generate::generate;

use serde::{Deserialize, Serialize};

/// Edge weight / path cost.
pub type Weight = u32;

/// Sentinel marking the absence of a path.
///
/// Using the maximal value (rather than a magic number like 9999) means no
/// legal path cost can collide with the marker. Relaxation arithmetic uses
/// saturating addition, so sums of finite weights can never wrap into it.
pub const UNREACHABLE: Weight = Weight::MAX;

/// N x N symmetric weighted adjacency matrix with zero diagonal.
///
/// Row-major flat storage; `row(i)` hands participant i its direct edge costs
/// as a contiguous slice. Off-diagonal entries are either a positive finite
/// weight or [`UNREACHABLE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyMatrix {
    n: usize,
    weights: Vec<Weight>,
}

impl AdjacencyMatrix {
    /// Create an all-zero matrix (every node connected at cost 0 to itself only
    /// once off-diagonal entries are filled in by the generator).
    pub fn zeroed(n: usize) -> Self {
        Self {
            n,
            weights: vec![0; n * n],
        }
    }

    /// Build a matrix from explicit rows. Used by tests and fixtures.
    pub fn from_rows(rows: &[Vec<Weight>]) -> crate::Result<Self> {
        let n = rows.len();
        let mut weights = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                anyhow::bail!("row {} has {} entries, expected {}", i, row.len(), n);
            }
            weights.extend_from_slice(row);
        }
        Ok(Self { n, weights })
    }

    /// Number of nodes (and participants).
    pub fn n(&self) -> usize {
        self.n
    }

    /// Weight of the direct edge i -> j.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Weight {
        self.weights[i * self.n + j]
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, w: Weight) {
        self.weights[i * self.n + j] = w;
    }

    /// Row i: node i's direct edge costs to every node.
    pub fn row(&self, i: usize) -> &[Weight] {
        &self.weights[i * self.n..(i + 1) * self.n]
    }

    /// Iterate over all rows in index order.
    pub fn rows(&self) -> impl Iterator<Item = &[Weight]> {
        self.weights.chunks(self.n)
    }

    /// Check the structural invariants: zero diagonal and symmetry.
    ///
    /// Run on every matrix received via broadcast before the exchange loop
    /// starts; a matrix violating these would silently break the pairing
    /// symmetry of the protocol.
    pub fn validate(&self) -> Result<(), String> {
        if self.weights.len() != self.n * self.n {
            return Err(format!(
                "matrix storage has {} entries, expected {}",
                self.weights.len(),
                self.n * self.n
            ));
        }
        for i in 0..self.n {
            if self.get(i, i) != 0 {
                return Err(format!("diagonal entry ({}, {}) is not zero", i, i));
            }
            for j in (i + 1)..self.n {
                if self.get(i, j) != self.get(j, i) {
                    return Err(format!(
                        "matrix is not symmetric at ({}, {}): {} != {}",
                        i,
                        j,
                        self.get(i, j),
                        self.get(j, i)
                    ));
                }
                if self.get(i, j) == 0 {
                    return Err(format!("off-diagonal entry ({}, {}) is zero", i, j));
                }
            }
        }
        Ok(())
    }
}
