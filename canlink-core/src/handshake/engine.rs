//! Role-aware handshake engine
//!
//! Pure over time: every entry point takes `now` as a parameter so the
//! engine tests without a clock. The node wraps these with its tick
//! source and maps the outcomes into its own error taxonomy.

use heapless::Vec;

use canlink_hal::{BusError, CanBus};

use super::{
    classify, tick_delta, LinkState, NodeRole, HANDSHAKE_REQUEST, HANDSHAKE_RESPONSE,
    PING_INTERVAL_MS,
};

/// Liveness bookkeeping for one tracked peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerInfo {
    /// Peer identifier (the id its pongs arrive under)
    pub id: u32,
    /// Tick of the last ping addressed to this peer
    pub last_sent_tick: u32,
    /// Tick of the last pong seen from this peer (0 = never)
    pub last_response_tick: u32,
    /// Current classification
    pub state: LinkState,
}

impl PeerInfo {
    fn new(id: u32) -> Self {
        Self {
            id,
            last_sent_tick: 0,
            last_response_tick: 0,
            state: LinkState::Waiting,
        }
    }
}

/// Outcome of a ping attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PingOutcome {
    /// Ping went out; peers were stamped
    Sent,
    /// Rate limit not yet elapsed; retry on a later tick
    Busy,
}

/// Errors from handling an incoming handshake frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakeError {
    /// Identifier matches neither a tracked peer nor the master
    UnknownId,
    /// Recognized identifier, wrong magic byte
    Protocol,
    /// Bus rejected the pong reply
    Bus(BusError),
}

/// Aggregate link health across all tracked peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkHealth {
    /// Every peer is active
    Healthy,
    /// At least one peer is waiting, timed out, or lost
    Degraded,
}

/// Per-node handshake state
///
/// Masters hold a peer table sorted by identifier (binary-searched on
/// every pong); listeners hold only the master identifier they answer to.
#[derive(Debug, Clone)]
pub struct HandshakeEngine<const P: usize> {
    role: NodeRole,
    self_id: u32,
    master_id: u32,
    last_sent_tick: u32,
    peers: Vec<PeerInfo, P>,
}

impl<const P: usize> HandshakeEngine<P> {
    /// Create an engine for the given role
    ///
    /// `peer_ids` is meaningful for [`NodeRole::Master`] (at most `P`
    /// entries; extras are dropped - the node validates the count first).
    /// `master_id` is meaningful for [`NodeRole::Listener`].
    pub fn new(role: NodeRole, self_id: u32, master_id: Option<u32>, peer_ids: &[u32]) -> Self {
        let mut peers: Vec<PeerInfo, P> = Vec::new();
        if role == NodeRole::Master {
            for &id in peer_ids {
                let _ = peers.push(PeerInfo::new(id));
            }
            peers.sort_unstable_by_key(|p| p.id);
        }
        Self {
            role,
            self_id,
            master_id: master_id.unwrap_or(0),
            last_sent_tick: 0,
            peers,
        }
    }

    /// Tracked peers in identifier order
    pub fn peers(&self) -> &[PeerInfo] {
        &self.peers
    }

    /// Attempt a ping broadcast (master only)
    ///
    /// The first ping always goes out; afterwards pings are rate limited
    /// to one per [`PING_INTERVAL_MS`], with [`PingOutcome::Busy`] meaning
    /// "not due yet", not a failure.
    pub fn send_ping<B: CanBus>(
        &mut self,
        now: u32,
        bus: &mut B,
    ) -> Result<PingOutcome, BusError> {
        if self.last_sent_tick != 0 && tick_delta(self.last_sent_tick, now) < PING_INTERVAL_MS {
            return Ok(PingOutcome::Busy);
        }

        bus.send(self.self_id, &[HANDSHAKE_REQUEST])?;
        self.last_sent_tick = now;
        for peer in self.peers.iter_mut() {
            peer.last_sent_tick = now;
        }
        Ok(PingOutcome::Sent)
    }

    /// Handle a frame that missed the data dispatch table
    ///
    /// Master: a pong from a tracked peer refreshes that peer. Listener: a
    /// ping from the configured master triggers an immediate pong reply.
    /// Role `None` ignores everything.
    pub fn handle_frame<B: CanBus>(
        &mut self,
        id: u32,
        payload: &[u8],
        now: u32,
        bus: &mut B,
    ) -> Result<(), HandshakeError> {
        match self.role {
            NodeRole::None => Ok(()),
            NodeRole::Master => {
                let idx = self
                    .peers
                    .binary_search_by_key(&id, |p| p.id)
                    .map_err(|_| HandshakeError::UnknownId)?;
                if payload.first() != Some(&HANDSHAKE_RESPONSE) {
                    return Err(HandshakeError::Protocol);
                }
                let peer = &mut self.peers[idx];
                peer.last_response_tick = now;
                peer.state = LinkState::Active;
                Ok(())
            }
            NodeRole::Listener => {
                if id != self.master_id {
                    return Err(HandshakeError::UnknownId);
                }
                if payload.first() != Some(&HANDSHAKE_REQUEST) {
                    return Err(HandshakeError::Protocol);
                }
                self.last_sent_tick = now;
                bus.send(self.self_id, &[HANDSHAKE_RESPONSE])
                    .map_err(HandshakeError::Bus)?;
                Ok(())
            }
        }
    }

    /// Reclassify every peer from elapsed time since its last response
    ///
    /// Peers that never responded stay [`LinkState::Waiting`] (no
    /// transition) but degrade the aggregate. Healthy only when every
    /// peer is active. Non-master roles track no peers and are always
    /// healthy.
    pub fn evaluate_all(&mut self, now: u32) -> LinkHealth {
        let mut health = LinkHealth::Healthy;
        for peer in self.peers.iter_mut() {
            if peer.last_response_tick == 0 {
                health = LinkHealth::Degraded;
                continue;
            }
            peer.state = classify(tick_delta(peer.last_response_tick, now));
            if peer.state != LinkState::Active {
                health = LinkHealth::Degraded;
            }
        }
        health
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::LOST_MS;
    use canlink_hal::FilterMode;

    const PEER_A: u32 = 0x701;
    const PEER_B: u32 = 0x702;
    const MASTER: u32 = 0x700;

    #[derive(Debug, Default)]
    struct MockBus {
        sent: Vec<(u32, Vec<u8, 8>), 16>,
        fail_send: bool,
    }

    impl CanBus for MockBus {
        fn send(&mut self, id: u32, payload: &[u8]) -> Result<(), BusError> {
            if self.fail_send {
                return Err(BusError::Fault);
            }
            let mut bytes = Vec::new();
            bytes.extend_from_slice(payload).unwrap();
            self.sent.push((id, bytes)).unwrap();
            Ok(())
        }

        fn configure_filter(&mut self, _mode: FilterMode, _ids: &[u32]) -> Result<(), BusError> {
            Ok(())
        }

        fn start(&mut self) -> Result<(), BusError> {
            Ok(())
        }

        fn enable_rx_notifications(&mut self) -> Result<(), BusError> {
            Ok(())
        }
    }

    fn master() -> HandshakeEngine<4> {
        HandshakeEngine::new(NodeRole::Master, MASTER, None, &[PEER_B, PEER_A])
    }

    #[test]
    fn test_ping_rate_limiting() {
        let mut engine = master();
        let mut bus = MockBus::default();

        // First ping always allowed, even well inside the interval
        assert_eq!(engine.send_ping(100, &mut bus), Ok(PingOutcome::Sent));
        assert_eq!(engine.send_ping(300, &mut bus), Ok(PingOutcome::Busy));
        assert_eq!(engine.send_ping(600, &mut bus), Ok(PingOutcome::Sent));

        assert_eq!(bus.sent.len(), 2);
        assert_eq!(bus.sent[0].0, MASTER);
        assert_eq!(bus.sent[0].1.as_slice(), &[HANDSHAKE_REQUEST]);
    }

    #[test]
    fn test_ping_bus_failure_does_not_stamp() {
        let mut engine = master();
        let mut bus = MockBus {
            fail_send: true,
            ..MockBus::default()
        };

        assert_eq!(engine.send_ping(100, &mut bus), Err(BusError::Fault));
        assert!(engine.peers().iter().all(|p| p.last_sent_tick == 0));

        // The failed attempt does not start the interval; the retry
        // goes out as soon as the bus recovers.
        bus.fail_send = false;
        assert_eq!(engine.send_ping(150, &mut bus), Ok(PingOutcome::Sent));
        assert_eq!(bus.sent.len(), 1);
    }

    #[test]
    fn test_ping_stamps_peers() {
        let mut engine = master();
        let mut bus = MockBus::default();
        engine.send_ping(250, &mut bus).unwrap();
        assert!(engine.peers().iter().all(|p| p.last_sent_tick == 250));
    }

    #[test]
    fn test_pong_refreshes_peer() {
        let mut engine = master();
        let mut bus = MockBus::default();

        engine
            .handle_frame(PEER_A, &[HANDSHAKE_RESPONSE], 420, &mut bus)
            .unwrap();

        let peer = engine.peers().iter().find(|p| p.id == PEER_A).unwrap();
        assert_eq!(peer.last_response_tick, 420);
        assert_eq!(peer.state, LinkState::Active);
    }

    #[test]
    fn test_pong_wrong_magic_is_protocol_error() {
        let mut engine = master();
        let mut bus = MockBus::default();
        assert_eq!(
            engine.handle_frame(PEER_A, &[0x00], 420, &mut bus),
            Err(HandshakeError::Protocol)
        );
    }

    #[test]
    fn test_unrecognized_id() {
        let mut engine = master();
        let mut bus = MockBus::default();
        assert_eq!(
            engine.handle_frame(0x999, &[HANDSHAKE_RESPONSE], 420, &mut bus),
            Err(HandshakeError::UnknownId)
        );
    }

    #[test]
    fn test_listener_replies_to_master_ping() {
        let mut engine: HandshakeEngine<4> =
            HandshakeEngine::new(NodeRole::Listener, PEER_A, Some(MASTER), &[]);
        let mut bus = MockBus::default();

        engine
            .handle_frame(MASTER, &[HANDSHAKE_REQUEST], 1000, &mut bus)
            .unwrap();

        assert_eq!(bus.sent.len(), 1);
        assert_eq!(bus.sent[0].0, PEER_A);
        assert_eq!(bus.sent[0].1.as_slice(), &[HANDSHAKE_RESPONSE]);
    }

    #[test]
    fn test_listener_rejects_other_ids() {
        let mut engine: HandshakeEngine<4> =
            HandshakeEngine::new(NodeRole::Listener, PEER_A, Some(MASTER), &[]);
        let mut bus = MockBus::default();
        assert_eq!(
            engine.handle_frame(0x123, &[HANDSHAKE_REQUEST], 1000, &mut bus),
            Err(HandshakeError::UnknownId)
        );
    }

    #[test]
    fn test_role_none_ignores_everything() {
        let mut engine: HandshakeEngine<4> =
            HandshakeEngine::new(NodeRole::None, 0x10, None, &[]);
        let mut bus = MockBus::default();
        assert_eq!(engine.handle_frame(0x999, &[0xFF], 50, &mut bus), Ok(()));
        assert!(bus.sent.is_empty());
    }

    #[test]
    fn test_evaluate_never_responded_is_degraded() {
        let mut engine = master();
        assert_eq!(engine.evaluate_all(5000), LinkHealth::Degraded);
        assert!(engine.peers().iter().all(|p| p.state == LinkState::Waiting));
    }

    #[test]
    fn test_evaluate_classification() {
        let mut engine = master();
        let mut bus = MockBus::default();

        engine
            .handle_frame(PEER_A, &[HANDSHAKE_RESPONSE], 1000, &mut bus)
            .unwrap();
        engine
            .handle_frame(PEER_B, &[HANDSHAKE_RESPONSE], 1000, &mut bus)
            .unwrap();

        // Both fresh
        assert_eq!(engine.evaluate_all(1400), LinkHealth::Healthy);

        // A answers again, B goes silent past the timeout
        engine
            .handle_frame(PEER_A, &[HANDSHAKE_RESPONSE], 1500, &mut bus)
            .unwrap();
        assert_eq!(engine.evaluate_all(1900), LinkHealth::Degraded);
        let b = engine.peers().iter().find(|p| p.id == PEER_B).unwrap();
        assert_eq!(b.state, LinkState::Timeout);

        // B silent past the lost threshold
        assert_eq!(engine.evaluate_all(1000 + LOST_MS), LinkHealth::Degraded);
        let b = engine.peers().iter().find(|p| p.id == PEER_B).unwrap();
        assert_eq!(b.state, LinkState::Lost);
    }

    #[test]
    fn test_evaluate_across_wraparound() {
        let mut engine = master();
        let mut bus = MockBus::default();

        let before_wrap = u32::MAX - 100;
        engine
            .handle_frame(PEER_A, &[HANDSHAKE_RESPONSE], before_wrap, &mut bus)
            .unwrap();
        engine
            .handle_frame(PEER_B, &[HANDSHAKE_RESPONSE], before_wrap, &mut bus)
            .unwrap();

        // 200 ticks elapsed across the wrap: still active
        engine.evaluate_all(99);
        assert!(engine.peers().iter().all(|p| p.state == LinkState::Active));
    }
}
