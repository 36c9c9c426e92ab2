//! Fallible allocation
//!
//! Every block buffer and segment slot table goes through a
//! [`BlockAllocator`], which reports failure as `OutOfMemory` instead of
//! aborting the process.

use crate::error::{Result, ScullError};

use super::segment::Block;

/// Source of block buffers and segment slot tables
pub trait BlockAllocator: Send + Sync {
    /// Allocate one block of exactly `quantum` bytes.
    ///
    /// Contents are unspecified; callers never rely on zero fill.
    fn allocate_block(&self, quantum: usize) -> Result<Block>;

    /// Allocate a slot table of `qset` empty slots for a new segment.
    fn allocate_slots(&self, qset: usize) -> Result<Vec<Option<Block>>>;
}

/// Global heap, using `try_reserve_exact` so exhaustion is reported
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl BlockAllocator for HeapAllocator {
    fn allocate_block(&self, quantum: usize) -> Result<Block> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(quantum)
            .map_err(|_| ScullError::OutOfMemory)?;
        buf.resize(quantum, 0);
        Ok(buf.into_boxed_slice())
    }

    fn allocate_slots(&self, qset: usize) -> Result<Vec<Option<Block>>> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(qset)
            .map_err(|_| ScullError::OutOfMemory)?;
        slots.resize_with(qset, || None);
        Ok(slots)
    }
}
