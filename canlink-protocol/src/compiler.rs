//! Frame compiler
//!
//! Turns validated [`FrameSpec`]s into finalized frame layouts. The
//! pipeline keeps validation and finalization separate on purpose:
//! [`validate`] is a pure predicate over the spec list and [`finalize`]
//! is a pure transform that assumes validation already passed.

use heapless::Vec;

use crate::signal::{SignalId, SignalStore};
use crate::spec::FrameSpec;
use crate::{MAX_FRAME_BYTES, MAX_FRAME_COUNT};

/// Frame spec validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Empty spec list, too many frames, a frame with no bindings, or a
    /// binding whose handle does not resolve in the store
    InvalidConfig,
    /// Computed frame length is 0 or exceeds 8 bytes
    LengthOutOfRange,
    /// An identifier appears more than once across the tx and rx sets
    DuplicateId(u32),
}

/// One payload byte of a compiled frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ByteSlot {
    /// Signal this byte belongs to
    pub signal: SignalId,
    /// Byte position within the signal (little-endian, 0 = LSB)
    pub byte: u8,
}

/// Finalized, transmittable frame layout
///
/// Immutable after compilation. The plan has exactly `dlc` slots; transmit
/// reads them in order to assemble a payload, receive writes them in order
/// to scatter a payload back into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFrame {
    /// Standard frame identifier
    pub id: u32,
    /// Data length code (1-8)
    pub dlc: u8,
    plan: Vec<ByteSlot, MAX_FRAME_BYTES>,
}

impl CompiledFrame {
    /// Byte plan in payload order
    pub fn plan(&self) -> &[ByteSlot] {
        &self.plan
    }
}

/// Compute a spec's data length code: the sum of its signals' byte widths
///
/// Handles that do not resolve in `store` contribute nothing; [`validate`]
/// rejects them before this matters.
pub fn frame_dlc<const S: usize>(store: &SignalStore<S>, fields: &[SignalId]) -> u8 {
    fields
        .iter()
        .map(|&sig| store.kind_of(sig).map_or(0, |k| k.width()))
        .sum()
}

/// Validate a spec list against the protocol limits
///
/// Checks the list shape (non-empty, at most [`MAX_FRAME_COUNT`] frames),
/// every binding (1-8 fields, handles resolve in `store`), and every
/// computed length (1-8 bytes). Pure predicate; commits nothing.
pub fn validate<const S: usize>(
    store: &SignalStore<S>,
    specs: &[FrameSpec],
) -> Result<(), ConfigError> {
    if specs.is_empty() || specs.len() > MAX_FRAME_COUNT {
        return Err(ConfigError::InvalidConfig);
    }

    for spec in specs {
        if spec.fields().is_empty() {
            return Err(ConfigError::InvalidConfig);
        }
        for &sig in spec.fields() {
            if store.kind_of(sig).is_none() {
                return Err(ConfigError::InvalidConfig);
            }
        }
        let dlc = frame_dlc(store, spec.fields());
        if dlc == 0 || dlc as usize > MAX_FRAME_BYTES {
            return Err(ConfigError::LengthOutOfRange);
        }
    }
    Ok(())
}

/// Expand validated specs into compiled frame layouts
///
/// Each signal becomes `width` consecutive byte slots in binding order,
/// least-significant byte first. Performs no validation: call only after
/// [`validate`] has passed, with `N >= specs.len()`.
pub fn finalize<const S: usize, const N: usize>(
    store: &SignalStore<S>,
    specs: &[FrameSpec],
) -> Vec<CompiledFrame, N> {
    let mut frames: Vec<CompiledFrame, N> = Vec::new();

    for spec in specs {
        let mut plan: Vec<ByteSlot, MAX_FRAME_BYTES> = Vec::new();
        for &sig in spec.fields() {
            let width = match store.kind_of(sig) {
                Some(kind) => kind.width(),
                None => continue,
            };
            for byte in 0..width {
                // Cannot overflow: validate bounds the total width at 8
                let _ = plan.push(ByteSlot { signal: sig, byte });
            }
        }

        let dlc = plan.len() as u8;
        let _ = frames.push(CompiledFrame {
            id: spec.id,
            dlc,
            plan,
        });
    }

    frames
}
