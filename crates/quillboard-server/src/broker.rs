//! The process-wide event broker.
//!
//! Holds no per-session state beyond socket identity: a broadcast
//! channel fans published frames out to every subscriber, and each
//! subscription filters out its own frames on receive (no echo to
//! sender). Delivery is fire-and-forget, at most once per currently
//! connected peer.

use dashmap::DashMap;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::warn;

/// Broadcast channel capacity. A subscriber that falls further behind
/// than this loses the gap (at-most-once delivery, no queueing).
const CHANNEL_CAPACITY: usize = 256;

/// A frame published by one peer: the sender's id and the raw JSON
/// payload, rebroadcast verbatim.
#[derive(Debug, Clone)]
pub struct RelayFrame {
    pub from: String,
    pub payload: String,
}

/// The fan-out broker.
pub struct Broker {
    tx: broadcast::Sender<RelayFrame>,
    /// Connected peers, by id.
    peers: DashMap<String, Instant>,
}

impl Broker {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            tx,
            peers: DashMap::new(),
        }
    }

    /// Register a peer and subscribe it to frames from the others.
    pub fn register(&self, peer_id: &str) -> Subscription {
        self.peers.insert(peer_id.to_string(), Instant::now());
        Subscription {
            peer_id: peer_id.to_string(),
            rx: self.tx.subscribe(),
        }
    }

    /// Remove a peer. No other cleanup: in-flight frames to a dead peer
    /// are dropped by the transport.
    pub fn unregister(&self, peer_id: &str) {
        self.peers.remove(peer_id);
    }

    /// Number of currently connected peers.
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Publish a frame to every other peer. Fire-and-forget: a send with
    /// no live subscribers is not an error.
    pub fn publish(&self, from: &str, payload: String) {
        let _ = self.tx.send(RelayFrame {
            from: from.to_string(),
            payload,
        });
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

/// A peer's subscription to the broker.
pub struct Subscription {
    peer_id: String,
    rx: broadcast::Receiver<RelayFrame>,
}

impl Subscription {
    /// Receive the next frame published by another peer.
    ///
    /// Frames this peer published itself are skipped, as are gaps from a
    /// lagged channel. Returns `None` once the broker is gone.
    pub async fn recv(&mut self) -> Option<String> {
        loop {
            match self.rx.recv().await {
                Ok(frame) if frame.from == self.peer_id => continue,
                Ok(frame) => return Some(frame.payload),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(peer = %self.peer_id, skipped, "subscription lagged, dropping frames");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
