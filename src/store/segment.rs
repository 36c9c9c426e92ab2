//! Segments and blocks
//!
//! A segment owns a fixed table of block slots and the next segment in
//! the chain. Blocks are plain boxed byte slices of exactly one quantum.

use crate::error::Result;

/// One quantum of storage
pub type Block = Box<[u8]>;

/// Fixed-capacity group of block slots plus the link to the next segment
pub(crate) struct Segment {
    slots: Vec<Option<Block>>,
    pub(crate) next: Option<Box<Segment>>,
}

impl Segment {
    /// Wrap a freshly allocated slot table; every slot must be empty
    pub(crate) fn new(slots: Vec<Option<Block>>) -> Self {
        Self { slots, next: None }
    }

    /// Block at `slot`, if it has been allocated
    pub(crate) fn block(&self, slot: usize) -> Option<&[u8]> {
        self.slots.get(slot)?.as_deref()
    }

    /// Block at `slot`, allocating it with `allocate` if the slot is empty
    pub(crate) fn block_or_allocate<F>(&mut self, slot: usize, allocate: F) -> Result<&mut Block>
    where
        F: FnOnce() -> Result<Block>,
    {
        let entry = &mut self.slots[slot];
        let block = match entry.take() {
            Some(block) => block,
            None => allocate()?,
        };
        Ok(entry.insert(block))
    }

    /// Number of allocated blocks counted contiguously from slot 0
    pub(crate) fn occupancy(&self) -> usize {
        self.slots.iter().take_while(|slot| slot.is_some()).count()
    }

    /// Drop every block this segment owns
    pub(crate) fn release_blocks(&mut self) {
        for slot in &mut self.slots {
            slot.take();
        }
    }
}

impl Drop for Segment {
    // Unlink the tail one segment at a time so long chains never recurse.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut segment) = next {
            next = segment.next.take();
        }
    }
}
