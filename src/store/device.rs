//! Store implementation
//!
//! One scull device: a lazily grown segment chain, its high-water mark,
//! and the lock serializing every access to both.

use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, ScullError};
use crate::layout::{Layout, Position};
use crate::lock::{CancelToken, InterruptibleMutex};

use super::alloc::BlockAllocator;
use super::segment::{Block, Segment};
use super::StoreStats;

/// Segment chain plus size, everything the lock protects
#[derive(Default)]
struct Chain {
    /// First segment, `None` until the first write
    head: Option<Box<Segment>>,

    /// High-water mark: furthest byte ever written + 1
    size: u64,
}

impl Chain {
    /// Segment at `index`, if the chain reaches that far
    fn segment(&self, index: usize) -> Option<&Segment> {
        let mut current = self.head.as_deref();
        for _ in 0..index {
            current = current?.next.as_deref();
        }
        current
    }

    /// Segment at `index`, allocating every missing segment up to it in
    /// chain order.
    ///
    /// Segments allocated before a failure stay linked.
    fn segment_or_extend(
        &mut self,
        index: usize,
        qset: usize,
        allocator: &dyn BlockAllocator,
    ) -> Result<&mut Segment> {
        let mut link = &mut self.head;
        for _ in 0..index {
            link = &mut Self::ensure(link, qset, allocator)?.next;
        }
        Self::ensure(link, qset, allocator)
    }

    fn ensure<'a>(
        link: &'a mut Option<Box<Segment>>,
        qset: usize,
        allocator: &dyn BlockAllocator,
    ) -> Result<&'a mut Segment> {
        let segment = match link.take() {
            Some(segment) => segment,
            None => {
                tracing::trace!(qset, "allocating segment");
                let slots = allocator.allocate_slots(qset)?;
                if slots.len() != qset {
                    return Err(ScullError::Config(format!(
                        "allocator returned {} slots for a {}-slot segment",
                        slots.len(),
                        qset
                    )));
                }
                // The two-word segment header uses the global allocator;
                // only the slot table and blocks go through `allocator`.
                Box::new(Segment::new(slots))
            }
        };
        Ok(&mut **link.insert(segment))
    }

    /// Block containing `position`, if both segment and slot exist
    fn block(&self, position: &Position) -> Option<&[u8]> {
        self.segment(position.segment)?.block(position.slot)
    }

    /// Release every segment from the head in chain order, then reset
    /// the size. Returns how many segments were released.
    fn clear(&mut self) -> usize {
        let mut released = 0;
        let mut next = self.head.take();
        while let Some(mut segment) = next {
            next = segment.next.take();
            segment.release_blocks();
            released += 1;
        }
        self.size = 0;
        released
    }

    fn iter(&self) -> impl Iterator<Item = &Segment> {
        std::iter::successors(self.head.as_deref(), |segment| segment.next.as_deref())
    }
}

/// A single in-memory storage device
///
/// ## Concurrency:
/// - Every operation holds the device lock from entry to return
/// - Waiting for the lock is the only blocking point and is cancellable
///   through the caller's [`CancelToken`]
/// - Devices are independent; there is no cross-device ordering
pub struct Store {
    /// Position in the owning manager
    index: usize,

    /// Quantum and segment capacity
    layout: Layout,

    /// Source of blocks and slot tables
    allocator: Arc<dyn BlockAllocator>,

    /// Chain and size, guarded together
    chain: InterruptibleMutex<Chain>,
}

impl Store {
    /// Create an empty device: no segments, size 0
    pub fn new(index: usize, layout: Layout, allocator: Arc<dyn BlockAllocator>) -> Self {
        Self {
            index,
            layout,
            allocator,
            chain: InterruptibleMutex::default(),
        }
    }

    /// Write up to `buf.len()` bytes at `offset`.
    ///
    /// Never crosses a block boundary: returns how many bytes were
    /// copied, which may be fewer than requested. The caller reissues for
    /// the rest.
    ///
    /// Errors:
    /// - `InvalidRange` if `offset + buf.len()` overflows (lock untouched)
    /// - `Interrupted` if `cancel` fires before the lock is acquired
    /// - `OutOfMemory` if a segment or block cannot be allocated; anything
    ///   allocated earlier in the call is kept and the size is unchanged
    pub fn write(&self, offset: u64, buf: &[u8], cancel: &CancelToken) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        check_range(offset, buf.len())?;
        let position = self.layout.locate(offset)?;

        let mut chain = self.chain.lock_interruptible(cancel)?;

        let quantum = self.layout.quantum();
        let segment =
            chain.segment_or_extend(position.segment, self.layout.qset(), self.allocator.as_ref())?;
        let block = segment.block_or_allocate(position.slot, || self.allocate_block())?;

        let count = buf.len().min(self.layout.block_remaining(&position));
        block[position.byte..position.byte + count].copy_from_slice(&buf[..count]);

        let end = offset + count as u64;
        if end > chain.size {
            chain.size = end;
        }

        tracing::trace!(device = self.index, offset, count, quantum, "write");
        Ok(count)
    }

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns 0 at or past the end of data. Never reads past the size
    /// and never crosses a block boundary in one call.
    ///
    /// Any offset at or past the size is end of data, however large the
    /// buffer. `Interrupted` if `cancel` fires before the lock is acquired.
    pub fn read(&self, offset: u64, buf: &mut [u8], cancel: &CancelToken) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let chain = self.chain.lock_interruptible(cancel)?;

        if offset >= chain.size {
            return Ok(0);
        }
        let position = self.layout.locate(offset)?;
        let available = chain.size - offset;
        let count = (buf.len() as u64).min(available) as usize;

        // A sparse hole below the size reads as end of data.
        let Some(block) = chain.block(&position) else {
            return Ok(0);
        };

        let count = count.min(self.layout.block_remaining(&position));
        buf[..count].copy_from_slice(&block[position.byte..position.byte + count]);

        tracing::trace!(device = self.index, offset, count, "read");
        Ok(count)
    }

    /// Release every segment and block and reset the size to 0.
    ///
    /// No-op on an empty device. `Interrupted` if `cancel` fires before
    /// the lock is acquired, in which case nothing is released.
    pub fn truncate(&self, cancel: &CancelToken) -> Result<()> {
        let mut chain = self.chain.lock_interruptible(cancel)?;
        let released = chain.clear();
        if released > 0 {
            tracing::debug!(device = self.index, segments = released, "truncated");
        }
        Ok(())
    }

    /// Introspection snapshot, taken under one lock hold
    pub fn stats(&self, cancel: &CancelToken) -> Result<StoreStats> {
        let chain = self.chain.lock_interruptible(cancel)?;
        Ok(StoreStats {
            index: self.index,
            quantum: self.layout.quantum(),
            qset: self.layout.qset(),
            size: chain.size,
            segments: chain.iter().map(Segment::occupancy).collect(),
        })
    }

    /// Contents of `[0, size)`, collected under one lock hold
    pub fn snapshot(&self, cancel: &CancelToken) -> Result<Bytes> {
        let chain = self.chain.lock_interruptible(cancel)?;
        let size = usize::try_from(chain.size).map_err(|_| {
            ScullError::InvalidRange(format!("size {} does not fit in memory", chain.size))
        })?;

        let quantum = self.layout.quantum();
        let mut out = BytesMut::with_capacity(size);
        let mut segments = chain.iter();

        'chain: while out.len() < size {
            let Some(segment) = segments.next() else {
                break;
            };
            for slot in 0..self.layout.qset() {
                let take = quantum.min(size - out.len());
                match segment.block(slot) {
                    Some(block) => out.extend_from_slice(&block[..take]),
                    None => out.put_bytes(0, take),
                }
                if out.len() == size {
                    break 'chain;
                }
            }
        }

        // Only reachable if the chain ends early.
        out.put_bytes(0, size - out.len());
        Ok(out.freeze())
    }

    /// Release everything without locking; the caller owns the device
    pub(crate) fn reset(&mut self) -> usize {
        self.chain.get_mut().clear()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current size (high-water mark). Waits for the lock, not cancellable.
    pub fn size(&self) -> u64 {
        self.chain.lock().size
    }

    /// Current size, waiting for the lock through `cancel`
    pub fn size_interruptible(&self, cancel: &CancelToken) -> Result<u64> {
        Ok(self.chain.lock_interruptible(cancel)?.size)
    }

    /// Whether some caller currently holds this device's lock
    pub fn is_locked(&self) -> bool {
        self.chain.is_locked()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn quantum(&self) -> usize {
        self.layout.quantum()
    }

    pub fn qset(&self) -> usize {
        self.layout.qset()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Allocate one block, rejecting allocators that hand back the wrong size
    fn allocate_block(&self) -> Result<Block> {
        let quantum = self.layout.quantum();
        let block = self.allocator.allocate_block(quantum)?;
        if block.len() != quantum {
            return Err(ScullError::Config(format!(
                "allocator returned {} bytes for a {}-byte block",
                block.len(),
                quantum
            )));
        }
        Ok(block)
    }
}

/// Reject requests whose end offset does not fit in a u64
fn check_range(offset: u64, len: usize) -> Result<()> {
    offset.checked_add(len as u64).map(|_| ()).ok_or_else(|| {
        ScullError::InvalidRange(format!("offset {} + length {} overflows", offset, len))
    })
}
