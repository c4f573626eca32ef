//! Identifier-sorted frame dispatch table
//!
//! Built once at node start from compiled, collision-checked frames;
//! read-only afterwards, so the receive-interrupt path and the main-loop
//! path can both search it without locking.

use heapless::Vec;

use crate::compiler::{CompiledFrame, ConfigError};
use crate::MAX_FRAME_COUNT;

/// Frames sorted by identifier, supporting binary search
#[derive(Debug, Clone, Default)]
pub struct FrameTable<const N: usize> {
    frames: Vec<CompiledFrame, N>,
}

impl<const N: usize> FrameTable<N> {
    /// Create an empty table
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Build a table from compiled frames
    ///
    /// Sorts ascending by identifier. Identifiers must already be distinct
    /// ([`check_unique`] runs first), so sort stability is irrelevant.
    pub fn build(mut frames: Vec<CompiledFrame, N>) -> Self {
        frames.sort_unstable_by_key(|f| f.id);
        Self { frames }
    }

    /// Look up a frame by identifier
    ///
    /// `None` means "not ours" - on the receive path that routes the frame
    /// to the handshake fallback rather than signalling an error.
    pub fn lookup(&self, id: u32) -> Option<&CompiledFrame> {
        self.frames
            .binary_search_by_key(&id, |f| f.id)
            .ok()
            .map(|idx| &self.frames[idx])
    }

    /// Frames in identifier order
    pub fn iter(&self) -> impl Iterator<Item = &CompiledFrame> {
        self.frames.iter()
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if the table holds no frames
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Verify no identifier is reused across the transmit and receive sets
///
/// A duplicate makes receive dispatch ambiguous, so this must pass before
/// the tables are committed and before the bus filter is programmed.
/// Returns Ok only when every identifier across both sets is unique.
pub fn check_unique(tx: &[CompiledFrame], rx: &[CompiledFrame]) -> Result<(), ConfigError> {
    let mut ids: Vec<u32, { MAX_FRAME_COUNT * 2 }> = Vec::new();
    for frame in tx.iter().chain(rx.iter()) {
        ids.push(frame.id).map_err(|_| ConfigError::InvalidConfig)?;
    }

    ids.sort_unstable();
    for pair in ids.windows(2) {
        if pair[0] == pair[1] {
            return Err(ConfigError::DuplicateId(pair[0]));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::finalize;
    use crate::signal::SignalStore;
    use crate::spec::FrameSpec;
    use proptest::prelude::*;

    fn frames_for(ids: &[u32]) -> Vec<CompiledFrame, MAX_FRAME_COUNT> {
        let mut store = SignalStore::<1>::new();
        let sig = store.alloc_u8(0).unwrap();
        let mut specs: Vec<FrameSpec, MAX_FRAME_COUNT> = Vec::new();
        for &id in ids {
            let mut spec = FrameSpec::new(id);
            spec.bind(sig).unwrap();
            specs.push(spec).unwrap();
        }
        finalize(&store, &specs)
    }

    #[test]
    fn test_lookup_hit_and_miss() {
        let table = FrameTable::build(frames_for(&[0x300, 0x100, 0x200]));
        assert_eq!(table.lookup(0x100).map(|f| f.id), Some(0x100));
        assert_eq!(table.lookup(0x200).map(|f| f.id), Some(0x200));
        assert_eq!(table.lookup(0x300).map(|f| f.id), Some(0x300));
        assert!(table.lookup(0x150).is_none());
        assert!(table.lookup(0x999).is_none());
    }

    #[test]
    fn test_iter_sorted_ascending() {
        let table = FrameTable::build(frames_for(&[0x500, 0x100, 0x300]));
        let ids: Vec<u32, 3> = table.iter().map(|f| f.id).collect();
        assert_eq!(ids.as_slice(), &[0x100, 0x300, 0x500]);
    }

    #[test]
    fn test_check_unique_disjoint_sets() {
        let tx = frames_for(&[0x100, 0x200]);
        let rx = frames_for(&[0x300, 0x400]);
        assert_eq!(check_unique(&tx, &rx), Ok(()));
    }

    #[test]
    fn test_check_unique_cross_set_duplicate() {
        let tx = frames_for(&[0x100, 0x200]);
        let rx = frames_for(&[0x300, 0x100]);
        assert_eq!(check_unique(&tx, &rx), Err(ConfigError::DuplicateId(0x100)));
    }

    #[test]
    fn test_check_unique_within_set_duplicate() {
        let tx = frames_for(&[0x200, 0x200]);
        assert_eq!(check_unique(&tx, &[]), Err(ConfigError::DuplicateId(0x200)));
    }

    proptest! {
        #[test]
        fn prop_lookup_membership(
            ids in prop::collection::btree_set(0u32..0x800, 1..=MAX_FRAME_COUNT),
            probe in 0u32..0x800,
        ) {
            let mut id_list: Vec<u32, MAX_FRAME_COUNT> = Vec::new();
            for &id in &ids {
                id_list.push(id).unwrap();
            }
            let table = FrameTable::build(frames_for(&id_list));

            for &id in &id_list {
                prop_assert_eq!(table.lookup(id).map(|f| f.id), Some(id));
            }
            prop_assert_eq!(table.lookup(probe).is_some(), ids.contains(&probe));
        }

        #[test]
        fn prop_unique_iff_no_repeats(
            ids in prop::collection::vec(0u32..0x40, 1..=32),
        ) {
            let frames = frames_for(&ids);
            let mut sorted: Vec<u32, 32> = Vec::new();
            for &id in &ids {
                sorted.push(id).unwrap();
            }
            sorted.sort_unstable();
            let has_dup = sorted.windows(2).any(|w| w[0] == w[1]);
            prop_assert_eq!(check_unique(&frames, &[]).is_err(), has_dup);
        }
    }
}
