//! Typed signal storage
//!
//! Application values are kept in an explicit arena and referenced by
//! handle. Compiled frames store handles plus byte offsets instead of raw
//! pointers, so a frame layout can never outlive or dangle into the
//! storage it was compiled against.

use heapless::Vec;

/// Width class of an application value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalKind {
    U8,
    U16,
    U32,
}

impl SignalKind {
    /// Byte width on the wire
    pub fn width(self) -> u8 {
        match self {
            SignalKind::U8 => 1,
            SignalKind::U16 => 2,
            SignalKind::U32 => 4,
        }
    }

    fn mask(self) -> u32 {
        match self {
            SignalKind::U8 => 0xFF,
            SignalKind::U16 => 0xFFFF,
            SignalKind::U32 => 0xFFFF_FFFF,
        }
    }
}

/// Opaque handle to a value in a [`SignalStore`]
///
/// Only the store that allocated a handle can resolve it; handles are
/// plain indices and carry no lifetime, so validation checks them against
/// the store before any frame layout is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalId(u16);

/// Errors from signal store operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Arena is at capacity
    Full,
    /// Handle does not resolve in this store
    BadHandle,
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    kind: SignalKind,
    value: u32,
}

/// Arena of typed application values
///
/// Values are widened to `u32` internally and masked to their declared
/// width on write. Per-byte access uses little-endian positions: byte 0
/// is the least significant byte.
#[derive(Debug, Clone, Default)]
pub struct SignalStore<const N: usize> {
    cells: Vec<Cell, N>,
}

impl<const N: usize> SignalStore<N> {
    /// Create an empty store
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Number of allocated signals
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no signals have been allocated
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Allocate a signal of the given kind with an initial value
    pub fn alloc(&mut self, kind: SignalKind, init: u32) -> Result<SignalId, StoreError> {
        let id = SignalId(self.cells.len() as u16);
        self.cells
            .push(Cell {
                kind,
                value: init & kind.mask(),
            })
            .map_err(|_| StoreError::Full)?;
        Ok(id)
    }

    /// Allocate a `u8` signal
    pub fn alloc_u8(&mut self, init: u8) -> Result<SignalId, StoreError> {
        self.alloc(SignalKind::U8, init as u32)
    }

    /// Allocate a `u16` signal
    pub fn alloc_u16(&mut self, init: u16) -> Result<SignalId, StoreError> {
        self.alloc(SignalKind::U16, init as u32)
    }

    /// Allocate a `u32` signal
    pub fn alloc_u32(&mut self, init: u32) -> Result<SignalId, StoreError> {
        self.alloc(SignalKind::U32, init)
    }

    /// Kind of the signal behind a handle, if it resolves here
    pub fn kind_of(&self, id: SignalId) -> Option<SignalKind> {
        self.cells.get(id.0 as usize).map(|c| c.kind)
    }

    /// Read a signal's current value (widened to `u32`)
    pub fn get(&self, id: SignalId) -> Option<u32> {
        self.cells.get(id.0 as usize).map(|c| c.value)
    }

    /// Overwrite a signal's value, masked to its declared width
    pub fn set(&mut self, id: SignalId, value: u32) -> Result<(), StoreError> {
        let cell = self.cells.get_mut(id.0 as usize).ok_or(StoreError::BadHandle)?;
        cell.value = value & cell.kind.mask();
        Ok(())
    }

    /// Read one byte of a signal (little-endian position)
    ///
    /// Returns `None` for a bad handle or a byte position outside the
    /// signal's width.
    pub fn read_byte(&self, id: SignalId, byte: u8) -> Option<u8> {
        let cell = self.cells.get(id.0 as usize)?;
        if byte >= cell.kind.width() {
            return None;
        }
        Some((cell.value >> (8 * byte as u32)) as u8)
    }

    /// Write one byte of a signal (little-endian position)
    pub fn write_byte(&mut self, id: SignalId, byte: u8, value: u8) -> Result<(), StoreError> {
        let cell = self.cells.get_mut(id.0 as usize).ok_or(StoreError::BadHandle)?;
        if byte >= cell.kind.width() {
            return Err(StoreError::BadHandle);
        }
        let shift = 8 * byte as u32;
        cell.value = (cell.value & !(0xFFu32 << shift)) | ((value as u32) << shift);
        Ok(())
    }
}
