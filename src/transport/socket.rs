//! TCP socket mesh
//!
//! Connects N participant processes into a full mesh of blocking TCP links,
//! one per unordered pair. Every participant knows the full host list; rank r
//! binds its own entry, dials every lower rank and accepts from every higher
//! rank, so each pair establishes exactly one connection.
//!
//! Hellos are exchanged on every link before the computation starts. A
//! protocol-version mismatch, a rank inconsistency, or a disagreement about
//! the participant count is a fatal precondition failure: the detecting
//! participant sends `Abort` on every link it has and exits, which takes the
//! remaining participants down on their next read. Only the bootstrap is
//! time-bounded; once the mesh is up, reads block indefinitely.

use crate::graph::{AdjacencyMatrix, Weight};
use crate::transport::wire::{
    self, AbortMessage, HelloMessage, Message, VectorMessage, PROTOCOL_VERSION,
};
use crate::transport::{ExchangeTransport, TransportError};
use std::io::ErrorKind;
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

/// One participant's handle into the TCP mesh.
pub struct SocketMesh {
    rank: usize,
    size: usize,
    node: String,
    /// Streams indexed by peer rank; `None` at our own slot.
    streams: Vec<Option<TcpStream>>,
    debug: bool,
}

impl SocketMesh {
    /// Join the mesh described by `hosts` as participant `rank`.
    ///
    /// `hosts[rank]` names our own listen address; every entry must carry a
    /// port. Blocks until all N-1 links are established and handshaked, or
    /// until `connect_timeout` elapses. On any bootstrap failure an `Abort`
    /// is sent on every link already up before the error is returned.
    pub fn connect(
        rank: usize,
        hosts: &[String],
        connect_timeout: Duration,
        debug: bool,
    ) -> Result<Self, TransportError> {
        let size = hosts.len();
        if size == 0 {
            return Err(TransportError::Precondition(
                "mesh host list is empty".to_string(),
            ));
        }
        if rank >= size {
            return Err(TransportError::Precondition(format!(
                "rank {} out of range for {} participants",
                rank, size
            )));
        }

        let node = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| format!("rank-{}", rank));

        let listen_port = port_of(&hosts[rank])?;
        let listener = TcpListener::bind(("0.0.0.0", listen_port))?;
        listener.set_nonblocking(true)?;

        if debug {
            eprintln!(
                "DEBUG: rank {} ({}) listening on port {}",
                rank, node, listen_port
            );
        }

        let mut mesh = Self {
            rank,
            size,
            node,
            streams: (0..size).map(|_| None).collect(),
            debug,
        };

        if let Err(e) = mesh.establish(hosts, &listener, connect_timeout) {
            mesh.abort(&e.to_string());
            return Err(e);
        }

        Ok(mesh)
    }

    fn establish(
        &mut self,
        hosts: &[String],
        listener: &TcpListener,
        connect_timeout: Duration,
    ) -> Result<(), TransportError> {
        let deadline = Instant::now() + connect_timeout;

        // Dial every lower rank. The dialer speaks first on each link.
        for peer in 0..self.rank {
            let mut stream = dial(&hosts[peer], deadline)?;
            stream.set_nodelay(true)?;

            wire::write_message(&mut stream, &self.hello())?;
            let hello = expect_hello(wire::read_message(&mut stream)?)?;
            self.check_hello(&hello, Some(peer))?;

            if self.debug {
                eprintln!(
                    "DEBUG: rank {} connected to rank {} ({})",
                    self.rank, hello.rank, hello.node
                );
            }
            self.streams[peer] = Some(stream);
        }

        // Accept every higher rank.
        let mut pending = self.size - self.rank - 1;
        while pending > 0 {
            let mut stream = accept(listener, deadline)?;
            stream.set_nonblocking(false)?;
            stream.set_nodelay(true)?;

            let hello = expect_hello(wire::read_message(&mut stream)?)?;
            self.check_hello(&hello, None)?;
            if hello.rank <= self.rank {
                return Err(TransportError::Precondition(format!(
                    "rank {} dialed us but should have accepted our dial",
                    hello.rank
                )));
            }
            if self.streams[hello.rank].is_some() {
                return Err(TransportError::Precondition(format!(
                    "duplicate connection from rank {}",
                    hello.rank
                )));
            }

            wire::write_message(&mut stream, &self.hello())?;

            if self.debug {
                eprintln!(
                    "DEBUG: rank {} accepted rank {} ({})",
                    self.rank, hello.rank, hello.node
                );
            }
            self.streams[hello.rank] = Some(stream);
            pending -= 1;
        }

        Ok(())
    }

    fn hello(&self) -> Message {
        Message::Hello(HelloMessage {
            protocol_version: PROTOCOL_VERSION,
            rank: self.rank,
            size: self.size,
            node: self.node.clone(),
        })
    }

    fn check_hello(
        &self,
        hello: &HelloMessage,
        expected_rank: Option<usize>,
    ) -> Result<(), TransportError> {
        if hello.protocol_version != PROTOCOL_VERSION {
            return Err(TransportError::Precondition(format!(
                "protocol version mismatch: peer {} speaks v{}, this node speaks v{}",
                hello.rank, hello.protocol_version, PROTOCOL_VERSION
            )));
        }
        if hello.size != self.size {
            return Err(TransportError::Precondition(format!(
                "participant count mismatch: rank {} ({}) expects {} participants, this mesh has {}",
                hello.rank, hello.node, hello.size, self.size
            )));
        }
        if hello.rank >= self.size {
            return Err(TransportError::Precondition(format!(
                "peer rank {} out of range for {} participants",
                hello.rank, self.size
            )));
        }
        if let Some(expected) = expected_rank {
            if hello.rank != expected {
                return Err(TransportError::Precondition(format!(
                    "dialed rank {} but peer identifies as rank {}",
                    expected, hello.rank
                )));
            }
        }
        Ok(())
    }

    /// Best-effort coordinated abort: push an `Abort` frame down every link.
    ///
    /// Peers surface it as [`TransportError::Aborted`] on their next read, so
    /// no participant is left blocking on a computation that cannot finish.
    pub fn abort(&mut self, reason: &str) {
        let msg = Message::Abort(AbortMessage {
            from: self.rank,
            reason: reason.to_string(),
        });
        for stream in self.streams.iter_mut().flatten() {
            let _ = wire::write_message(stream, &msg);
        }
    }

    fn stream_mut(&mut self, peer: usize) -> Result<&mut TcpStream, TransportError> {
        if peer >= self.size || peer == self.rank {
            return Err(TransportError::Protocol(format!(
                "rank {} has no mesh link to rank {}",
                self.rank, peer
            )));
        }
        self.streams[peer]
            .as_mut()
            .ok_or(TransportError::Disconnected { peer })
    }

    fn recv_message(&mut self, from: usize) -> Result<Message, TransportError> {
        let stream = self.stream_mut(from)?;
        match wire::read_message(stream) {
            Ok(msg) => Ok(msg),
            Err(TransportError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(TransportError::Disconnected { peer: from })
            }
            Err(e) => Err(e),
        }
    }
}

impl ExchangeTransport for SocketMesh {
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
                    let msg = Message::Matrix(matrix.clone());
                    wire::write_message(self.stream_mut(to)?, &msg)?;
                }
            }
            Ok(matrix)
        } else {
            match self.recv_message(origin)? {
                Message::Matrix(m) => Ok(m),
                Message::Abort(a) => Err(TransportError::Aborted {
                    from: a.from,
                    reason: a.reason,
                }),
                _ => Err(TransportError::Protocol(
                    "expected matrix broadcast, got another frame".to_string(),
                )),
            }
        }
    }

    fn send(&mut self, vector: &[Weight], to: usize) -> Result<(), TransportError> {
        let msg = Message::Vector(VectorMessage {
            from: self.rank,
            distances: vector.to_vec(),
        });
        wire::write_message(self.stream_mut(to)?, &msg)
    }

    fn receive(&mut self, from: usize) -> Result<Vec<Weight>, TransportError> {
        match self.recv_message(from)? {
            Message::Vector(v) => {
                if v.from != from {
                    return Err(TransportError::Protocol(format!(
                        "vector on link to rank {} claims to be from rank {}",
                        from, v.from
                    )));
                }
                Ok(v.distances)
            }
            Message::Abort(a) => Err(TransportError::Aborted {
                from: a.from,
                reason: a.reason,
            }),
            _ => Err(TransportError::Protocol(
                "expected distance vector, got another frame".to_string(),
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

fn expect_hello(msg: Message) -> Result<HelloMessage, TransportError> {
    match msg {
        Message::Hello(h) => Ok(h),
        Message::Abort(a) => Err(TransportError::Aborted {
            from: a.from,
            reason: a.reason,
        }),
        _ => Err(TransportError::Protocol(
            "expected handshake, got another frame".to_string(),
        )),
    }
}

fn port_of(addr: &str) -> Result<u16, TransportError> {
    let port = addr.rsplit(':').next().and_then(|p| p.parse().ok());
    port.ok_or_else(|| {
        TransportError::Precondition(format!("host entry '{}' has no usable port", addr))
    })
}

fn dial(addr: &str, deadline: Instant) -> Result<TcpStream, TransportError> {
    loop {
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                if Instant::now() >= deadline {
                    return Err(TransportError::Precondition(format!(
                        "timed out connecting to {}: {}",
                        addr, e
                    )));
                }
                std::thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

fn accept(listener: &TcpListener, deadline: Instant) -> Result<TcpStream, TransportError> {
    loop {
        match listener.accept() {
            Ok((stream, _)) => return Ok(stream),
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                if Instant::now() >= deadline {
                    return Err(TransportError::Precondition(
                        "timed out waiting for peer connections".to_string(),
                    ));
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Reserve localhost ports by binding to port 0 and releasing them.
    fn free_local_hosts(count: usize) -> Vec<String> {
        (0..count)
            .map(|_| {
                let listener = TcpListener::bind("127.0.0.1:0").unwrap();
                let port = listener.local_addr().unwrap().port();
                drop(listener);
                format!("127.0.0.1:{}", port)
            })
            .collect()
    }

    #[test]
    fn test_mesh_handshake_and_exchange() {
        let hosts = free_local_hosts(3);
        let timeout = Duration::from_secs(10);

        let handles: Vec<_> = (0..3)
            .map(|rank| {
                let hosts = hosts.clone();
                thread::spawn(move || {
                    let mut mesh = SocketMesh::connect(rank, &hosts, timeout, false).unwrap();

                    // One symmetric exchange with every peer, ascending.
                    let mine = vec![rank as Weight; 3];
                    let mut seen = Vec::new();
                    for peer in 0..3 {
                        if peer == rank {
                            continue;
                        }
                        mesh.send(&mine, peer).unwrap();
                        seen.push(mesh.receive(peer).unwrap());
                    }
                    seen
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results[0], vec![vec![1, 1, 1], vec![2, 2, 2]]);
        assert_eq!(results[1], vec![vec![0, 0, 0], vec![2, 2, 2]]);
        assert_eq!(results[2], vec![vec![0, 0, 0], vec![1, 1, 1]]);
    }

    #[test]
    fn test_mesh_broadcast_and_gather() {
        let hosts = free_local_hosts(3);
        let timeout = Duration::from_secs(10);
        let matrix = AdjacencyMatrix::from_rows(&[vec![0, 1, 2], vec![1, 0, 3], vec![2, 3, 0]])
            .unwrap();

        let handles: Vec<_> = (0..3)
            .map(|rank| {
                let hosts = hosts.clone();
                let seed = if rank == 0 { Some(matrix.clone()) } else { None };
                thread::spawn(move || {
                    let mut mesh = SocketMesh::connect(rank, &hosts, timeout, false).unwrap();
                    let m = mesh.broadcast(seed, 0).unwrap();
                    mesh.gather(m.row(rank), 0).unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(
            results[0],
            Some(vec![vec![0, 1, 2], vec![1, 0, 3], vec![2, 3, 0]])
        );
        assert!(results[1].is_none());
        assert!(results[2].is_none());
    }

    #[test]
    fn test_participant_count_mismatch_aborts() {
        let hosts = free_local_hosts(3);
        let timeout = Duration::from_secs(10);

        // Rank 0 believes the mesh has two participants, rank 1 believes three.
        let short_hosts = hosts[..2].to_vec();
        let long_hosts = hosts.clone();

        let h0 = thread::spawn(move || SocketMesh::connect(0, &short_hosts, timeout, false));
        let h1 = thread::spawn(move || SocketMesh::connect(1, &long_hosts, timeout, false));

        let r0 = h0.join().unwrap();
        let r1 = h1.join().unwrap();

        match r0 {
            Err(TransportError::Precondition(msg)) => {
                assert!(msg.contains("participant count mismatch"), "got: {}", msg)
            }
            _ => panic!("rank 0 should refuse the mismatched mesh"),
        }
        assert!(r1.is_err());
    }
}
