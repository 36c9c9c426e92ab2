//! Configuration for scull
//!
//! Centralized configuration with sensible defaults. Values are fixed
//! for the lifetime of a [`Manager`](crate::Manager); changing them means
//! tearing the manager down and building a new one.

use crate::error::{Result, ScullError};
use crate::layout::Layout;

/// Default bytes per block
pub const DEFAULT_QUANTUM: usize = 4000;

/// Default block slots per segment
pub const DEFAULT_QSET: usize = 1000;

/// Default number of devices
pub const DEFAULT_NR_DEVS: usize = 1;

/// Main configuration for a set of scull devices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Layout Configuration
    // -------------------------------------------------------------------------
    /// Bytes per block (Q)
    pub quantum: usize,

    /// Block slots per segment (S)
    pub qset: usize,

    // -------------------------------------------------------------------------
    // Manager Configuration
    // -------------------------------------------------------------------------
    /// Number of independent devices
    pub nr_devs: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
            nr_devs: DEFAULT_NR_DEVS,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the configuration describes a usable set of devices
    pub fn validate(&self) -> Result<()> {
        if self.nr_devs == 0 {
            return Err(ScullError::Config("nr_devs must be at least 1".to_string()));
        }
        Layout::from_config(self)?;
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the block size in bytes
    pub fn quantum(mut self, bytes: usize) -> Self {
        self.config.quantum = bytes;
        self
    }

    /// Set the number of block slots per segment
    pub fn qset(mut self, slots: usize) -> Self {
        self.config.qset = slots;
        self
    }

    /// Set the number of devices
    pub fn nr_devs(mut self, count: usize) -> Self {
        self.config.nr_devs = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
