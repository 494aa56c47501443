//! Aligned buffer arena owned by one pipeline run.
//!
//! Replaces fixed global buffers: every large buffer a run needs is carved
//! from an [`Arena`] with a configurable start-address alignment (16 bytes
//! for DMA-capable transform hardware). The arena keeps a ledger of live
//! bytes so callers can assert that nothing outlives a run, and can be given
//! a byte limit to model a constrained heap.

use crate::error::ArenaError;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Default start-address alignment in bytes.
pub const DEFAULT_ALIGNMENT: usize = 16;

#[derive(Debug, Default)]
struct Ledger {
    live_bytes: Cell<usize>,
    live_buffers: Cell<usize>,
    peak_bytes: Cell<usize>,
}

/// Allocator for aligned, fixed-length buffers.
#[derive(Debug, Clone)]
pub struct Arena {
    alignment: usize,
    limit: Option<usize>,
    ledger: Rc<Ledger>,
}

impl Arena {
    /// Create an arena with the given alignment and no byte limit.
    ///
    /// # Errors
    /// [`ArenaError::InvalidAlignment`] unless `alignment` is a power of two.
    pub fn new(alignment: usize) -> Result<Self, ArenaError> {
        Self::build(alignment, None)
    }

    /// Create an arena that refuses allocations once `limit` bytes are live.
    pub fn with_limit(alignment: usize, limit: usize) -> Result<Self, ArenaError> {
        Self::build(alignment, Some(limit))
    }

    fn build(alignment: usize, limit: Option<usize>) -> Result<Self, ArenaError> {
        if !alignment.is_power_of_two() {
            return Err(ArenaError::InvalidAlignment(alignment));
        }
        Ok(Self {
            alignment,
            limit,
            ledger: Rc::new(Ledger::default()),
        })
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Bytes held by buffers that have not been dropped yet.
    pub fn live_bytes(&self) -> usize {
        self.ledger.live_bytes.get()
    }

    /// Number of buffers that have not been dropped yet.
    pub fn live_buffers(&self) -> usize {
        self.ledger.live_buffers.get()
    }

    /// Highest value `live_bytes` has reached.
    pub fn peak_bytes(&self) -> usize {
        self.ledger.peak_bytes.get()
    }

    /// Allocate a zero-initialised buffer of `len` elements.
    ///
    /// The first element's address is a multiple of the arena alignment.
    ///
    /// # Errors
    /// * [`ArenaError::Exhausted`] if the byte limit would be exceeded
    /// * [`ArenaError::Unaligned`] if the allocator returned storage whose
    ///   address cannot be advanced to the alignment in whole elements
    pub fn alloc<T: Copy + Default>(&self, len: usize) -> Result<AlignedBuffer<T>, ArenaError> {
        let elem = std::mem::size_of::<T>().max(1);
        let bytes = len.saturating_mul(elem);
        let live = self.live_bytes();
        if let Some(limit) = self.limit {
            let available = limit.saturating_sub(live);
            if bytes > available {
                return Err(ArenaError::Exhausted {
                    requested: bytes,
                    available,
                });
            }
        }

        let slack = self.alignment.div_ceil(elem);
        let storage = vec![T::default(); len + slack];
        let offset = storage.as_ptr().align_offset(self.alignment);
        if offset > slack {
            return Err(ArenaError::Unaligned {
                alignment: self.alignment,
                element: elem,
            });
        }

        let ledger = &self.ledger;
        ledger.live_bytes.set(live + bytes);
        ledger.live_buffers.set(ledger.live_buffers.get() + 1);
        if ledger.live_bytes.get() > ledger.peak_bytes.get() {
            ledger.peak_bytes.set(ledger.live_bytes.get());
        }

        Ok(AlignedBuffer {
            storage,
            offset,
            len,
            bytes,
            ledger: Rc::clone(&self.ledger),
        })
    }
}

/// A fixed-length buffer whose start address honours the arena alignment.
///
/// Only slice access is exposed, so the length chosen at allocation time
/// can never change. Dropping the buffer returns its bytes to the arena
/// ledger.
pub struct AlignedBuffer<T> {
    storage: Vec<T>,
    offset: usize,
    len: usize,
    bytes: usize,
    ledger: Rc<Ledger>,
}

impl<T> AlignedBuffer<T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        &self.storage[self.offset..self.offset + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.storage[self.offset..self.offset + self.len]
    }

    /// Start address of the visible slice.
    pub fn addr(&self) -> usize {
        self.as_slice().as_ptr() as usize
    }
}

impl<T> std::ops::Deref for AlignedBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> std::ops::DerefMut for AlignedBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> Drop for AlignedBuffer<T> {
    fn drop(&mut self) {
        let ledger = &self.ledger;
        ledger
            .live_bytes
            .set(ledger.live_bytes.get().saturating_sub(self.bytes));
        ledger
            .live_buffers
            .set(ledger.live_buffers.get().saturating_sub(1));
    }
}

impl<T: fmt::Debug> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("addr", &format_args!("{:#x}", self.addr()))
            .finish()
    }
}
