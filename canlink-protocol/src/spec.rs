//! Declarative frame descriptions
//!
//! A [`FrameSpec`] names a frame identifier and the ordered signals that
//! compose its payload. Specs exist only until node start: the compiler
//! consumes them and produces [`CompiledFrame`](crate::CompiledFrame)s.

use heapless::Vec;

use crate::signal::SignalId;
use crate::MAX_FIELDS;

/// Errors building a frame spec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpecError {
    /// More than [`MAX_FIELDS`] bindings on one frame
    TooManyFields,
}

/// Declarative description of one frame's value bindings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    /// Standard frame identifier
    pub id: u32,
    fields: Vec<SignalId, MAX_FIELDS>,
}

impl FrameSpec {
    /// Create a spec with no bindings yet
    pub fn new(id: u32) -> Self {
        Self {
            id,
            fields: Vec::new(),
        }
    }

    /// Append a signal binding
    ///
    /// Payload bytes follow binding order, so the first bound signal
    /// occupies the first payload bytes.
    pub fn bind(&mut self, signal: SignalId) -> Result<(), SpecError> {
        self.fields.push(signal).map_err(|_| SpecError::TooManyFields)
    }

    /// Bound signals in payload order
    pub fn fields(&self) -> &[SignalId] {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalStore;

    #[test]
    fn test_bind_order_preserved() {
        let mut store = SignalStore::<3>::new();
        let a = store.alloc_u8(0).unwrap();
        let b = store.alloc_u16(0).unwrap();
        let c = store.alloc_u8(0).unwrap();

        let mut spec = FrameSpec::new(0x100);
        spec.bind(b).unwrap();
        spec.bind(a).unwrap();
        spec.bind(c).unwrap();

        assert_eq!(spec.fields(), &[b, a, c]);
    }

    #[test]
    fn test_too_many_fields() {
        let mut store = SignalStore::<9>::new();
        let mut spec = FrameSpec::new(0x100);
        for _ in 0..MAX_FIELDS {
            let id = store.alloc_u8(0).unwrap();
            spec.bind(id).unwrap();
        }
        let extra = store.alloc_u8(0).unwrap();
        assert_eq!(spec.bind(extra), Err(SpecError::TooManyFields));
    }
}
