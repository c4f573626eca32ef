//! Node context: the aggregate a bus participant runs
//!
//! Owns the transmit and receive frame tables, the handshake engine, the
//! bus and clock handles, and the lifecycle status. The four steady-state
//! operations map onto the host's loops: `send_all` and
//! `evaluate_handshakes` from the periodic main loop, `receive_one` from
//! the receive-interrupt callback.

pub mod status;

pub use status::NodeStatus;

use heapless::Vec;

use canlink_hal::{CanBus, FilterMode, Monotonic};
use canlink_protocol::{
    check_unique, finalize, validate, CompiledFrame, ConfigError, FrameSpec, FrameTable,
    SignalStore, MAX_FRAME_BYTES, MAX_FRAME_COUNT,
};

use crate::handshake::{HandshakeEngine, HandshakeError, LinkHealth, NodeRole, PeerInfo, PingOutcome};

/// Node-level errors and statuses
///
/// Configuration-time errors latch the node status; runtime errors
/// (`UnknownId`, `Protocol`, `Transmit`, `Busy`, `LinkDegraded`) are
/// per-call and leave the node usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError {
    /// Malformed caller input at construction
    InvalidParameter,
    /// Frame spec list failed static validation
    InvalidConfig,
    /// A frame's computed length is 0 or exceeds 8 bytes
    LengthOutOfRange,
    /// An identifier is reused across the tx and rx sets
    DuplicateId(u32),
    /// Bus acceptance filter could not be programmed
    FilterConfig,
    /// Bus controller failed to start
    Start,
    /// Receive notifications could not be enabled
    Notification,
    /// Steady-state operation before `start`
    NotStarted,
    /// Received frame matches no data frame and no handshake peer
    UnknownId(u32),
    /// Recognized frame with a semantically invalid payload
    Protocol,
    /// Bus rejected a transmission
    Transmit,
    /// Rate-limited operation attempted before its interval elapsed
    Busy,
    /// At least one peer is not active
    LinkDegraded,
}

impl From<ConfigError> for NodeError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidConfig => NodeError::InvalidConfig,
            ConfigError::LengthOutOfRange => NodeError::LengthOutOfRange,
            ConfigError::DuplicateId(id) => NodeError::DuplicateId(id),
        }
    }
}

/// Construction-time configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeConfig<'a> {
    /// This node's own identifier (used for its handshake frames)
    pub self_id: u32,
    /// Handshake behavior
    pub role: NodeRole,
    /// Identifier of the master this node answers (listener role)
    pub master_id: Option<u32>,
    /// Peers to track for liveness (master role)
    pub peer_ids: &'a [u32],
    /// Acceptance filter behavior programmed at start
    pub filter: FilterMode,
}

/// A node on the bus
///
/// - `TX` / `RX`: capacity of the transmit and receive frame tables
/// - `P`: capacity of the peer table (master role)
#[derive(Debug)]
pub struct Node<B, M, const TX: usize, const RX: usize, const P: usize> {
    bus: B,
    clock: M,
    role: NodeRole,
    master_id: Option<u32>,
    filter: FilterMode,
    tx: FrameTable<TX>,
    rx: FrameTable<RX>,
    handshake: HandshakeEngine<P>,
    status: NodeStatus,
}

impl<B, M, const TX: usize, const RX: usize, const P: usize> Node<B, M, TX, RX, P>
where
    B: CanBus,
    M: Monotonic,
{
    /// Construct a node in the `Ready` state
    ///
    /// A master needs a non-empty peer list that fits the peer table; a
    /// listener needs a configured master identifier.
    pub fn new(config: NodeConfig<'_>, bus: B, clock: M) -> Result<Self, NodeError> {
        match config.role {
            NodeRole::Master => {
                if config.peer_ids.is_empty() || config.peer_ids.len() > P {
                    return Err(NodeError::InvalidParameter);
                }
            }
            NodeRole::Listener => {
                if config.master_id.is_none() {
                    return Err(NodeError::InvalidParameter);
                }
            }
            NodeRole::None => {}
        }

        Ok(Self {
            bus,
            clock,
            role: config.role,
            master_id: config.master_id,
            filter: config.filter,
            tx: FrameTable::new(),
            rx: FrameTable::new(),
            handshake: HandshakeEngine::new(
                config.role,
                config.self_id,
                config.master_id,
                config.peer_ids,
            ),
            status: NodeStatus::Ready,
        })
    }

    /// Current lifecycle status
    pub fn status(&self) -> NodeStatus {
        self.status
    }

    /// Tracked peers in identifier order (master role)
    pub fn peers(&self) -> &[PeerInfo] {
        self.handshake.peers()
    }

    fn fail(&mut self, err: NodeError) -> NodeError {
        self.status = NodeStatus::Failed(err);
        err
    }

    /// Compile the frame sets and bring up the bus
    ///
    /// Validates and finalizes both spec lists, rejects identifier
    /// collisions, then programs the filter, starts the controller, and
    /// enables receive notifications - in that order. Any failure latches
    /// terminally; only full success reaches `Started`.
    pub fn start<const S: usize>(
        &mut self,
        store: &SignalStore<S>,
        tx_specs: &[FrameSpec],
        rx_specs: &[FrameSpec],
    ) -> Result<(), NodeError> {
        match self.status {
            NodeStatus::Ready => {}
            NodeStatus::Started => return Err(NodeError::InvalidParameter),
            NodeStatus::Failed(err) => return Err(err),
        }

        if tx_specs.len() > TX || rx_specs.len() > RX {
            return Err(self.fail(NodeError::InvalidConfig));
        }

        if let Err(err) = validate(store, tx_specs) {
            return Err(self.fail(err.into()));
        }
        if let Err(err) = validate(store, rx_specs) {
            return Err(self.fail(err.into()));
        }

        let tx_frames: Vec<CompiledFrame, TX> = finalize(store, tx_specs);
        let rx_frames: Vec<CompiledFrame, RX> = finalize(store, rx_specs);

        if let Err(err) = check_unique(&tx_frames, &rx_frames) {
            return Err(self.fail(err.into()));
        }

        // Everything the node expects to receive: data frames plus the
        // handshake identifiers for its role.
        let mut accept: Vec<u32, { MAX_FRAME_COUNT * 2 }> = Vec::new();
        for frame in rx_frames.iter() {
            let _ = accept.push(frame.id);
        }
        match self.role {
            NodeRole::Master => {
                for peer in self.handshake.peers() {
                    let _ = accept.push(peer.id);
                }
            }
            NodeRole::Listener => {
                if let Some(id) = self.master_id {
                    let _ = accept.push(id);
                }
            }
            NodeRole::None => {}
        }

        self.tx = FrameTable::build(tx_frames);
        self.rx = FrameTable::build(rx_frames);

        let filter = self.filter;
        if self.bus.configure_filter(filter, &accept).is_err() {
            return Err(self.fail(NodeError::FilterConfig));
        }
        if self.bus.start().is_err() {
            return Err(self.fail(NodeError::Start));
        }
        if self.bus.enable_rx_notifications().is_err() {
            return Err(self.fail(NodeError::Notification));
        }

        self.status = NodeStatus::Started;
        Ok(())
    }

    /// Serialize and transmit every tx frame, in identifier order
    ///
    /// Fails fast: the first bus rejection surfaces as
    /// [`NodeError::Transmit`] and remaining frames are not sent. A master
    /// follows a fully successful pass with a ping attempt; the ping's
    /// own rate limit is not a transmit failure.
    pub fn send_all<const S: usize>(&mut self, store: &SignalStore<S>) -> Result<(), NodeError> {
        self.status.ready_guard()?;

        for frame in self.tx.iter() {
            let mut payload = [0u8; MAX_FRAME_BYTES];
            for (i, slot) in frame.plan().iter().enumerate() {
                payload[i] = store
                    .read_byte(slot.signal, slot.byte)
                    .ok_or(NodeError::InvalidParameter)?;
            }
            self.bus
                .send(frame.id, &payload[..frame.dlc as usize])
                .map_err(|_| NodeError::Transmit)?;
        }

        if self.role == NodeRole::Master {
            let now = self.clock.now_ms();
            self.handshake
                .send_ping(now, &mut self.bus)
                .map_err(|_| NodeError::Transmit)?;
        }
        Ok(())
    }

    /// Dispatch one received frame
    ///
    /// Data frames write their payload back into the store through the
    /// compiled byte plan; everything else falls through to the handshake
    /// engine. Called from the receive-interrupt context: bounded work,
    /// no allocation.
    pub fn receive_one<const S: usize>(
        &mut self,
        store: &mut SignalStore<S>,
        id: u32,
        payload: &[u8],
    ) -> Result<(), NodeError> {
        self.status.ready_guard()?;

        if let Some(frame) = self.rx.lookup(id) {
            if payload.len() < frame.dlc as usize {
                return Err(NodeError::Protocol);
            }
            for (i, slot) in frame.plan().iter().enumerate() {
                store
                    .write_byte(slot.signal, slot.byte, payload[i])
                    .map_err(|_| NodeError::Protocol)?;
            }
            return Ok(());
        }

        let now = self.clock.now_ms();
        match self.handshake.handle_frame(id, payload, now, &mut self.bus) {
            Ok(()) => Ok(()),
            Err(HandshakeError::UnknownId) => Err(NodeError::UnknownId(id)),
            Err(HandshakeError::Protocol) => Err(NodeError::Protocol),
            Err(HandshakeError::Bus(_)) => Err(NodeError::Transmit),
        }
    }

    /// Attempt a ping outside the `send_all` cycle (master only)
    pub fn send_ping(&mut self) -> Result<PingOutcome, NodeError> {
        self.status.ready_guard()?;
        if self.role != NodeRole::Master {
            return Err(NodeError::InvalidParameter);
        }
        let now = self.clock.now_ms();
        self.handshake
            .send_ping(now, &mut self.bus)
            .map_err(|_| NodeError::Transmit)
    }

    /// Reclassify every peer and report aggregate link health
    ///
    /// Ok only when every tracked peer is active; any waiting, timed-out,
    /// or lost peer folds into one coarse [`NodeError::LinkDegraded`].
    /// Per-peer detail stays inspectable via [`Node::peers`].
    pub fn evaluate_handshakes(&mut self) -> Result<(), NodeError> {
        self.status.ready_guard()?;
        let now = self.clock.now_ms();
        match self.handshake.evaluate_all(now) {
            LinkHealth::Healthy => Ok(()),
            LinkHealth::Degraded => Err(NodeError::LinkDegraded),
        }
    }
}
