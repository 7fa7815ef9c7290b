//! Exchange transport abstraction
//!
//! The protocol only ever talks to the fabric through [`ExchangeTransport`]:
//! a fixed group of participants ranked `0..N-1` with blocking point-to-point
//! messaging plus broadcast and gather collectives. Two implementations exist:
//!
//! - [`channel::ChannelEndpoint`] - in-process full mesh of crossbeam channels,
//!   used by the standalone runner and by unit tests
//! - [`socket::SocketMesh`] - blocking TCP full mesh between processes, framed
//!   with the versioned wire protocol in [`wire`]
//!
//! All operations block until satisfied and all failures are fatal: the
//! round-convergence guarantee depends on every eligible vector arriving every
//! round, so there is no retry and no degraded mode.

pub mod channel;
pub mod socket;
pub mod wire;

use crate::graph::{AdjacencyMatrix, Weight};
use thiserror::Error;

/// Transport-layer failure. All variants abort the whole computation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// A bootstrap precondition does not hold (participant count, rank range,
    /// protocol version). Detected before any exchange round runs.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A peer went away mid-computation.
    #[error("peer {peer} disconnected")]
    Disconnected { peer: usize },

    /// A frame arrived that the protocol does not allow at this point.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A peer signalled a coordinated abort.
    #[error("aborted by rank {from}: {reason}")]
    Aborted { from: usize, reason: String },

    /// Socket-level IO failure.
    #[error("transport IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Point-to-point + collective messaging fabric for N ranked participants.
///
/// `send`/`receive` are rank-addressed and blocking. Callers must keep the
/// pairing symmetric: if rank A sends-then-receives with B in a given round, B
/// must send-then-receive with A in that round. Implementations buffer at
/// least one in-flight vector per directed pair, which is what makes the
/// symmetric send-first pattern deadlock-free.
pub trait ExchangeTransport {
    /// This participant's rank.
    fn rank(&self) -> usize;

    /// Total number of participants.
    fn size(&self) -> usize;

    /// Distribute the adjacency matrix from `origin` to every participant.
    ///
    /// The origin passes `Some(matrix)` and gets its own copy back; everyone
    /// else passes `None` and receives the origin's copy.
    fn broadcast(
        &mut self,
        matrix: Option<AdjacencyMatrix>,
        origin: usize,
    ) -> Result<AdjacencyMatrix, TransportError>;

    /// Send a full distance vector to `to`. Blocks until the transport has
    /// accepted the message.
    fn send(&mut self, vector: &[Weight], to: usize) -> Result<(), TransportError>;

    /// Block until the full distance vector from `from` arrives.
    fn receive(&mut self, from: usize) -> Result<Vec<Weight>, TransportError>;

    /// Collect every participant's vector at `root`, ordered by rank.
    ///
    /// Returns `Some(rows)` at the root and `None` everywhere else.
    fn gather(
        &mut self,
        vector: &[Weight],
        root: usize,
    ) -> Result<Option<Vec<Vec<Weight>>>, TransportError>;
}
