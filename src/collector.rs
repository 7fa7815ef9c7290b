//! Result collection
//!
//! After every participant has converged, the final per-node vectors are
//! gathered at one designated rank and assembled into the output matrix. Only
//! the collecting rank gets a result; every other participant's call is just
//! its contribution to the collective.

use crate::graph::Weight;
use crate::transport::{ExchangeTransport, TransportError};

/// N x N matrix of converged shortest-path costs; row r is participant r's
/// final distance vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceMatrix {
    rows: Vec<Vec<Weight>>,
}

impl DistanceMatrix {
    pub fn from_rows(rows: Vec<Vec<Weight>>) -> Self {
        Self { rows }
    }

    pub fn n(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, i: usize, j: usize) -> Weight {
        self.rows[i][j]
    }

    pub fn row(&self, i: usize) -> &[Weight] {
        &self.rows[i]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Weight]> {
        self.rows.iter().map(|r| r.as_slice())
    }
}

/// Gather every participant's converged vector at `root`.
///
/// Returns `Some(matrix)` at the root, `None` everywhere else. Must only be
/// called once the local node has converged; the gather blocks until every
/// participant has contributed.
pub fn collect<T: ExchangeTransport>(
    transport: &mut T,
    local_vector: &[Weight],
    root: usize,
) -> Result<Option<DistanceMatrix>, TransportError> {
    Ok(transport
        .gather(local_vector, root)?
        .map(DistanceMatrix::from_rows))
}
