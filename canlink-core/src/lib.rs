//! Canlink node runtime
//!
//! Board-agnostic runtime for a node on a shared CAN bus:
//!
//! - Handshake engine: master pings, listener pongs, wraparound-safe
//!   timing, per-peer link classification
//! - Node lifecycle state machine with latched start failures
//! - Transmit engine (serialize every bound signal, periodic) and
//!   receive engine (dispatch one frame, interrupt context)
//!
//! The bus controller and tick source stay behind the `canlink-hal`
//! traits; frame layouts come compiled from `canlink-protocol`.

#![no_std]
#![deny(unsafe_code)]

pub mod handshake;
pub mod node;

pub use handshake::{
    classify, tick_delta, HandshakeEngine, HandshakeError, LinkHealth, LinkState, NodeRole,
    PeerInfo, PingOutcome, HANDSHAKE_REQUEST, HANDSHAKE_RESPONSE, LOST_MS, PING_INTERVAL_MS,
    TIMEOUT_MS,
};
pub use node::{Node, NodeConfig, NodeError, NodeStatus};
