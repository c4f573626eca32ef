//! CAN bus abstractions
//!
//! Provides the transmit and bring-up primitives a canlink node consumes.
//! Implementations wrap the actual controller driver (bxCAN, FDCAN, a
//! socketcan device, or a mock for host tests).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors reported by a bus backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// No transmit mailbox free right now
    Busy,
    /// Controller rejected the operation
    Fault,
}

/// Acceptance filter behavior programmed during node start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FilterMode {
    /// Accept every standard-identifier frame on the bus
    #[default]
    AcceptAll,
    /// Accept only the identifiers handed to `configure_filter`
    Exact,
}

/// CAN controller interface
///
/// All frames are standard-identifier data frames with 1-8 payload bytes.
/// The setup methods are called exactly once, in order, during node start:
/// `configure_filter`, then `start`, then `enable_rx_notifications`.
pub trait CanBus {
    /// Enqueue one frame for transmission
    ///
    /// `payload` is already trimmed to the frame's DLC (1-8 bytes).
    fn send(&mut self, id: u32, payload: &[u8]) -> Result<(), BusError>;

    /// Program the acceptance filter
    ///
    /// In [`FilterMode::Exact`], `ids` lists every identifier the node
    /// expects to receive (data frames plus handshake identifiers). In
    /// [`FilterMode::AcceptAll`] the list may be ignored.
    fn configure_filter(&mut self, mode: FilterMode, ids: &[u32]) -> Result<(), BusError>;

    /// Start the controller
    fn start(&mut self) -> Result<(), BusError>;

    /// Enable receive-interrupt notifications
    fn enable_rx_notifications(&mut self) -> Result<(), BusError>;
}
