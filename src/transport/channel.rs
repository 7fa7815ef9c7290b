//! In-process channel mesh
//!
//! Connects N participants running as threads in one process with a full mesh
//! of crossbeam channels, one dedicated channel per directed pair. This is the
//! transport behind standalone mode and the one unit tests substitute in.
//!
//! Unbounded channels give every directed pair at least one in-flight message
//! of buffering, which is what the symmetric send-then-receive pairing of the
//! exchange loop requires to stay deadlock-free.
//!
//! Dropping an endpoint disconnects all of its channels; peers observe that as
//! [`TransportError::Disconnected`] on their next operation. That cascade is
//! the in-process form of the uniform abort: one failing participant takes the
//! whole computation down with no partial result.

use crate::graph::{AdjacencyMatrix, Weight};
use crate::transport::{ExchangeTransport, TransportError};
use crossbeam::channel::{unbounded, Receiver, Sender};

/// One message on a mesh channel.
#[derive(Debug, Clone)]
enum Frame {
    Matrix(AdjacencyMatrix),
    Vector(Vec<Weight>),
}

/// One participant's handle into the channel mesh.
pub struct ChannelEndpoint {
    rank: usize,
    size: usize,
    /// Senders indexed by destination rank; `None` at our own slot.
    outgoing: Vec<Option<Sender<Frame>>>,
    /// Receivers indexed by source rank; `None` at our own slot.
    incoming: Vec<Option<Receiver<Frame>>>,
}

/// Build a full mesh of N endpoints, one per rank.
pub fn build_mesh(size: usize) -> Vec<ChannelEndpoint> {
    let mut endpoints: Vec<ChannelEndpoint> = (0..size)
        .map(|rank| ChannelEndpoint {
            rank,
            size,
            outgoing: vec![None; size],
            incoming: vec![None; size],
        })
        .collect();

    for from in 0..size {
        for to in 0..size {
            if from == to {
                continue;
            }
            let (tx, rx) = unbounded();
            endpoints[from].outgoing[to] = Some(tx);
            endpoints[to].incoming[from] = Some(rx);
        }
    }

    endpoints
}

impl ChannelEndpoint {
    fn send_frame(&self, frame: Frame, to: usize) -> Result<(), TransportError> {
        if to >= self.size || to == self.rank {
            return Err(TransportError::Protocol(format!(
                "rank {} cannot send to rank {}",
                self.rank, to
            )));
        }
        let tx = self.outgoing[to]
            .as_ref()
            .expect("mesh channel missing for valid peer");
        tx.send(frame)
            .map_err(|_| TransportError::Disconnected { peer: to })
    }

    fn receive_frame(&self, from: usize) -> Result<Frame, TransportError> {
        if from >= self.size || from == self.rank {
            return Err(TransportError::Protocol(format!(
                "rank {} cannot receive from rank {}",
                self.rank, from
            )));
        }
        let rx = self.incoming[from]
            .as_ref()
            .expect("mesh channel missing for valid peer");
        rx.recv()
            .map_err(|_| TransportError::Disconnected { peer: from })
    }
}

impl ExchangeTransport for ChannelEndpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn broadcast(
        &mut self,
        matrix: Option<AdjacencyMatrix>,
        origin: usize,
    ) -> Result<AdjacencyMatrix, TransportError> {
        if origin >= self.size {
            return Err(TransportError::Protocol(format!(
                "broadcast origin {} out of range for {} participants",
                origin, self.size
            )));
        }

        if self.rank == origin {
            let matrix = matrix.ok_or_else(|| {
                TransportError::Protocol("broadcast origin must supply the payload".to_string())
            })?;
            for to in 0..self.size {
                if to != self.rank {
                    self.send_frame(Frame::Matrix(matrix.clone()), to)?;
                }
            }
            Ok(matrix)
        } else {
            match self.receive_frame(origin)? {
                Frame::Matrix(m) => Ok(m),
                Frame::Vector(_) => Err(TransportError::Protocol(
                    "expected matrix broadcast, got distance vector".to_string(),
                )),
            }
        }
    }

    fn send(&mut self, vector: &[Weight], to: usize) -> Result<(), TransportError> {
        self.send_frame(Frame::Vector(vector.to_vec()), to)
    }

    fn receive(&mut self, from: usize) -> Result<Vec<Weight>, TransportError> {
        match self.receive_frame(from)? {
            Frame::Vector(v) => Ok(v),
            Frame::Matrix(_) => Err(TransportError::Protocol(
                "expected distance vector, got matrix broadcast".to_string(),
            )),
        }
    }

    fn gather(
        &mut self,
        vector: &[Weight],
        root: usize,
    ) -> Result<Option<Vec<Vec<Weight>>>, TransportError> {
        if root >= self.size {
            return Err(TransportError::Protocol(format!(
                "gather root {} out of range for {} participants",
                root, self.size
            )));
        }

        if self.rank == root {
            let mut rows = Vec::with_capacity(self.size);
            for from in 0..self.size {
                if from == self.rank {
                    rows.push(vector.to_vec());
                } else {
                    rows.push(self.receive(from)?);
                }
            }
            Ok(Some(rows))
        } else {
            self.send(vector, root)?;
            Ok(None)
        }
    }
}
