//! Store Module
//!
//! Sparse, segmented in-memory storage for one device.
//!
//! ## Responsibilities
//! - Translate logical offsets into (segment, slot, byte)
//! - Allocate segments and blocks only when a write reaches them
//! - Bound every read and write to a single block (short I/O)
//! - Serialize all access through one cancellable lock per device
//!
//! ## Memory Layout
//! ```text
//!  Store
//!  ┌──────────────┐
//!  │ head ────────┼──► Segment 0 ──────────► Segment 1 ──────────► None
//!  │ size (N)     │    ┌────┬────┬─────┐     ┌────┬────┬─────┐
//!  │ lock         │    │ B0 │ -- │ ... │     │ -- │ B1 │ ... │   S slots
//!  └──────────────┘    └─┬──┴────┴─────┘     └────┴─┬──┴─────┘
//!                        ▼                          ▼
//!                     [Q bytes]                  [Q bytes]
//! ```

mod alloc;
mod device;
mod segment;

use std::fmt;

pub use alloc::{BlockAllocator, HeapAllocator};
pub use device::Store;
pub use segment::Block;

/// Point-in-time view of one device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Device index in its manager
    pub index: usize,

    /// Bytes per block
    pub quantum: usize,

    /// Block slots per segment
    pub qset: usize,

    /// High-water mark in bytes
    pub size: u64,

    /// Per segment, in chain order: blocks allocated contiguously from slot 0
    pub segments: Vec<usize>,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Device {}: qset {}, q {}, sz {}",
            self.index, self.qset, self.quantum, self.size
        )?;
        for (i, blocks) in self.segments.iter().enumerate() {
            writeln!(f, "  segment {}: {} blocks", i, blocks)?;
        }
        Ok(())
    }
}
