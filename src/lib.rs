//! # scull
//!
//! Sparse, segmented in-memory storage devices with:
//! - Byte-addressable, growable storage with no backing medium
//! - Lazy allocation of segments and fixed-size blocks on first write
//! - Short-read/short-write semantics at block boundaries
//! - One exclusive, cancellable lock per device
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Handle (open mode)                       │
//! │           WriteOnly open ──► truncate, then write            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Manager                               │
//! │              nr_devs Stores, lookup by index                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Store 0   │   ...    │  Store n-1  │
//!   │ (lock + N)  │          │ (lock + N)  │
//!   └──────┬──────┘          └─────────────┘
//!          │
//!          ▼
//!   Segment ──► Segment ──► ...     (S block slots each)
//!      │
//!      ▼
//!   Block [Q bytes]
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod layout;
pub mod lock;
pub mod store;
pub mod manager;
pub mod handle;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ScullError};
pub use config::Config;
pub use handle::{Handle, OpenMode};
pub use layout::{Layout, Position};
pub use lock::CancelToken;
pub use manager::Manager;
pub use store::{Block, BlockAllocator, HeapAllocator, Store, StoreStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scull
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
