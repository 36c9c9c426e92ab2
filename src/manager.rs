//! Store Manager
//!
//! Owns the fixed set of devices built at startup.
//!
//! ## Responsibilities
//! - Build `nr_devs` empty devices sharing one layout and allocator
//! - Look devices up by index
//! - Tear every device down, in index order, at shutdown
//!
//! The manager has no lock of its own; concurrency is per device.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, ScullError};
use crate::layout::Layout;
use crate::lock::CancelToken;
use crate::store::{BlockAllocator, HeapAllocator, Store};

/// Fixed, index-addressed collection of devices
pub struct Manager {
    /// Configuration the devices were built from
    config: Config,

    /// Layout shared by every device
    layout: Layout,

    /// Devices, index == position; never moved or reassigned
    devices: Vec<Store>,
}

impl Manager {
    /// Build the devices described by `config` on the global heap
    pub fn new(config: Config) -> Result<Self> {
        Self::with_allocator(config, Arc::new(HeapAllocator))
    }

    /// Build the devices described by `config` using `allocator`
    pub fn with_allocator(config: Config, allocator: Arc<dyn BlockAllocator>) -> Result<Self> {
        config.validate()?;
        let layout = Layout::from_config(&config)?;

        let devices = (0..config.nr_devs)
            .map(|index| Store::new(index, layout, Arc::clone(&allocator)))
            .collect();

        tracing::info!(
            nr_devs = config.nr_devs,
            quantum = config.quantum,
            qset = config.qset,
            "scull devices initialized"
        );

        Ok(Self {
            config,
            layout,
            devices,
        })
    }

    /// Device at `index`
    pub fn device(&self, index: usize) -> Result<&Store> {
        self.devices
            .get(index)
            .ok_or(ScullError::NoSuchDevice(index))
    }

    /// All devices in index order
    pub fn devices(&self) -> &[Store] {
        &self.devices
    }

    /// Number of devices
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// `/proc`-style listing of every device, in index order
    pub fn report(&self, cancel: &CancelToken) -> Result<String> {
        let mut out = String::new();
        for device in &self.devices {
            out.push_str(&device.stats(cancel)?.to_string());
        }
        Ok(out)
    }

    /// Truncate every device in index order and release them
    pub fn shutdown(self) {
        drop(self);
    }

    fn teardown(&mut self) {
        let mut released = 0;
        for device in &mut self.devices {
            released += device.reset();
        }
        self.devices.clear();
        tracing::info!(segments = released, "scull devices released");
    }
}

impl Drop for Manager {
    fn drop(&mut self) {
        self.teardown();
    }
}
