//! Address translation
//!
//! Maps a logical byte offset onto `(segment, slot, byte)` for a given
//! quantum Q and segment capacity S:
//!
//! ```text
//!   segment = O / (Q * S)
//!   slot    = (O / Q) mod S
//!   byte    = O mod Q
//! ```
//!
//! Pure arithmetic; nothing here allocates or locks.

use crate::config::Config;
use crate::error::{Result, ScullError};

/// Validated quantum / segment-capacity pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    quantum: usize,
    qset: usize,
}

/// Location of a byte inside the segment chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the segment in the chain (0 = head)
    pub segment: usize,

    /// Block slot inside that segment
    pub slot: usize,

    /// Byte inside that block
    pub byte: usize,
}

impl Layout {
    /// Build a layout; both values must be at least 1 and their product
    /// must fit in `usize`.
    pub fn new(quantum: usize, qset: usize) -> Result<Self> {
        if quantum == 0 || qset == 0 {
            return Err(ScullError::Config(format!(
                "quantum ({}) and qset ({}) must be at least 1",
                quantum, qset
            )));
        }
        if quantum.checked_mul(qset).is_none() {
            return Err(ScullError::Config(format!(
                "quantum ({}) * qset ({}) overflows",
                quantum, qset
            )));
        }
        Ok(Self { quantum, qset })
    }

    /// Build the layout described by a config
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.quantum, config.qset)
    }

    /// Bytes per block (Q)
    pub fn quantum(&self) -> usize {
        self.quantum
    }

    /// Block slots per segment (S)
    pub fn qset(&self) -> usize {
        self.qset
    }

    /// Bytes addressed by one full segment (Q * S)
    pub fn segment_span(&self) -> u64 {
        // Checked in `new`; usize always fits in u64 on supported targets.
        (self.quantum * self.qset) as u64
    }

    /// Translate a logical offset.
    ///
    /// Fails with `InvalidRange` only when the segment index does not fit
    /// the platform word.
    pub fn locate(&self, offset: u64) -> Result<Position> {
        let quantum = self.quantum as u64;
        let segment = offset / self.segment_span();
        let segment = usize::try_from(segment).map_err(|_| {
            ScullError::InvalidRange(format!("offset {} is beyond addressable segments", offset))
        })?;

        Ok(Position {
            segment,
            slot: ((offset / quantum) % self.qset as u64) as usize,
            byte: (offset % quantum) as usize,
        })
    }

    /// Bytes left in the block containing `position`
    pub fn block_remaining(&self, position: &Position) -> usize {
        self.quantum - position.byte
    }
}
