//! Random graph generation
//!
//! Produces the adjacency matrix the computation runs on: symmetric, zero
//! diagonal, weights drawn uniformly from `[1, max_weight]`, and each unordered
//! pair independently severed with the configured probability.
//!
//! Uses the xoshiro256++ PRNG; a fixed seed reproduces the exact same graph,
//! which the tests and the `--verify` cross-check rely on.

use super::{AdjacencyMatrix, UNREACHABLE};
use crate::config::GraphConfig;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Generate a random adjacency matrix from the graph parameters.
///
/// Each unordered pair (i, j) is decided once and mirrored, so the result is
/// symmetric by construction. The diagonal stays zero.
pub fn generate(config: &GraphConfig) -> AdjacencyMatrix {
    let mut rng = match config.seed {
        Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
        None => Xoshiro256PlusPlus::from_entropy(),
    };

    let n = config.nodes;
    let mut matrix = AdjacencyMatrix::zeroed(n);

    for i in 0..n {
        for j in (i + 1)..n {
            let weight = if rng.gen_bool(config.unreachable_probability) {
                UNREACHABLE
            } else {
                rng.gen_range(1..=config.max_weight)
            };
            matrix.set(i, j, weight);
            matrix.set(j, i, weight);
        }
    }

    matrix
}
