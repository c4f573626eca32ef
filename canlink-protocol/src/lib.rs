//! Canlink frame layout model and compile pipeline
//!
//! Application values live in a [`SignalStore`] and are bound by handle
//! into declarative [`FrameSpec`]s. At startup the compiler turns the
//! specs into finalized frame layouts:
//!
//! ```text
//! FrameSpec ──validate──▶ Ok ──finalize──▶ CompiledFrame ──build──▶ FrameTable
//!   (id +                 (limits           (id + DLC +              (sorted,
//!    signals)              checked)          byte plan)               bsearch)
//! ```
//!
//! A compiled frame carries a byte plan: one slot per payload byte, each
//! naming a signal and a byte position within it. Transmit reads the plan
//! in order to assemble a payload; receive writes the same plan in order,
//! so multi-byte values round-trip bit-for-bit. Byte order is
//! little-endian, least-significant byte first.
//!
//! Everything here is pure and table-driven; the stateful runtime (node
//! lifecycle, handshake) lives in `canlink-core`.

#![no_std]
#![deny(unsafe_code)]

pub mod compiler;
pub mod signal;
pub mod spec;
pub mod table;

pub use compiler::{finalize, frame_dlc, validate, ByteSlot, CompiledFrame, ConfigError};
pub use signal::{SignalId, SignalKind, SignalStore, StoreError};
pub use spec::{FrameSpec, SpecError};
pub use table::{check_unique, FrameTable};

/// Maximum number of value bindings per frame
pub const MAX_FIELDS: usize = 8;

/// Maximum payload bytes per frame (classic CAN data field)
pub const MAX_FRAME_BYTES: usize = 8;

/// Maximum number of frames per direction (tx or rx)
pub const MAX_FRAME_COUNT: usize = 128;
