//! Canlink hardware abstraction layer
//!
//! This crate defines the traits a canlink node needs from its host
//! environment. Chip-specific backends (bxCAN, FDCAN, socketcan, a test
//! mock) implement these; everything above them is board-agnostic.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application / firmware                 │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  canlink-core (Node, handshake)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  canlink-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  bxCAN/FDCAN  │       │   test mock   │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`bus::CanBus`] - frame transmission and one-time bus bring-up
//! - [`clock::Monotonic`] - free-running millisecond tick source

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod clock;

// Re-export key traits at crate root for convenience
pub use bus::{BusError, CanBus, FilterMode};
pub use clock::Monotonic;
