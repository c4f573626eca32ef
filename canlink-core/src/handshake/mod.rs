//! Handshake liveness layer
//!
//! A master node broadcasts a one-byte ping under its own identifier;
//! listeners answer with a one-byte pong under theirs. The master tracks
//! when each peer last answered and classifies the link from the elapsed
//! time. All arithmetic is wraparound-safe on a free-running u32
//! millisecond counter.

pub mod engine;

pub use engine::{HandshakeEngine, HandshakeError, LinkHealth, PeerInfo, PingOutcome};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ping payload magic byte (master -> peers)
pub const HANDSHAKE_REQUEST: u8 = 0xA5;

/// Pong payload magic byte (peer -> master)
pub const HANDSHAKE_RESPONSE: u8 = 0x5A;

/// Minimum interval between pings
pub const PING_INTERVAL_MS: u32 = 500;

/// Elapsed time after which a silent peer counts as timed out
pub const TIMEOUT_MS: u32 = 700;

/// Elapsed time after which a silent peer counts as lost
pub const LOST_MS: u32 = 2000;

/// Handshake behavior of a node, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NodeRole {
    /// Originates pings, tracks peer liveness
    Master,
    /// Answers pings from the configured master
    Listener,
    /// Ignores handshake traffic entirely
    #[default]
    None,
}

/// Liveness classification of one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Never handshaked yet
    Waiting,
    /// Responded within the timeout window
    Active,
    /// Silent past [`TIMEOUT_MS`] but not yet lost
    Timeout,
    /// Silent past [`LOST_MS`]
    Lost,
}

/// Elapsed ticks from `sent` to `seen` on a wrapping u32 counter
///
/// Correct across a single wraparound of the counter:
/// `tick_delta(u32::MAX - 5, 5) == 11`.
pub fn tick_delta(sent: u32, seen: u32) -> u32 {
    seen.wrapping_sub(sent)
}

/// Classify a link from elapsed ticks since the peer was last heard
pub fn classify(delta: u32) -> LinkState {
    if delta >= LOST_MS {
        LinkState::Lost
    } else if delta > TIMEOUT_MS {
        LinkState::Timeout
    } else {
        LinkState::Active
    }
}
